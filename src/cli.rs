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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::check::check_config;
use crate::cmd::serve::server::start_server;
use crate::config::Config;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Open the attendance client in the browser.
    Serve {
        /// Path to the config file. Defaults to `rollcall.toml` if present.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Port of the local server.
        #[arg(long)]
        port: Option<u16>,
        /// Base URL of the attendance service.
        #[arg(long)]
        service_url: Option<String>,
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
    },
    /// Validate the config file and print the resolved configuration.
    Check {
        /// Path to the config file. Defaults to `rollcall.toml` if present.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            config,
            port,
            service_url,
            no_open,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(service_url) = service_url {
                config.service_url = service_url;
            }
            if no_open {
                config.open_browser = false;
            }
            start_server(config).await
        }
        Command::Check { config } => check_config(config.as_deref()),
    }
}
