// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use crate::config::Config;
use crate::error::Fallible;

/// Load and validate the configuration, then print it as JSON.
pub fn check_config(path: Option<&Path>) -> Fallible<()> {
    let config = Config::load(path)?;
    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");
    Ok(())
}
