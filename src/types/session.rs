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

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use serde::Serialize;

/// Characters left as-is in query values and path segments.
pub const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The (date, class, subject, timing) tuple identifying one attendance-marking
/// instance. Fields missing from the query string are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub timing: String,
}

impl Session {
    /// The first-lecture absentees are only known for a (date, class) pair.
    pub fn wants_first_lecture(&self) -> bool {
        !self.date.is_empty() && !self.class.is_empty()
    }

    pub fn wants_roster(&self) -> bool {
        !self.class.is_empty()
    }

    /// Encode the session as the query string the board route expects.
    pub fn to_query(&self) -> String {
        [
            ("date", &self.date),
            ("class", &self.class),
            ("subject", &self.subject),
            ("timing", &self.timing),
        ]
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, COMPONENT)))
        .collect::<Vec<_>>()
        .join("&")
    }
}
