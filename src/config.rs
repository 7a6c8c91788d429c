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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::subject::SubjectCatalog;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "rollcall.toml";

/// The on-disk configuration. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    service_url: Option<String>,
    port: Option<u16>,
    open_browser: Option<bool>,
    default_filename: Option<String>,
    download_dir: Option<PathBuf>,
    classes: Option<Vec<String>>,
    subjects: Option<Vec<String>>,
    timings: Option<Vec<String>>,
    catalog: Option<SubjectCatalog>,
}

/// Resolved configuration.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the attendance service.
    pub service_url: String,
    /// Port of the local server.
    pub port: u16,
    pub open_browser: bool,
    /// Filename used when the service does not suggest one.
    pub default_filename: String,
    /// If set, every downloaded file is also written here.
    pub download_dir: Option<PathBuf>,
    /// Options offered by the session form.
    pub classes: Vec<String>,
    pub subjects: Vec<String>,
    pub timings: Vec<String>,
    pub catalog: SubjectCatalog,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5001".to_string(),
            port: 8000,
            open_browser: true,
            default_filename: "attendance.xlsx".to_string(),
            download_dir: None,
            classes: strings(&["TY", "SY"]),
            subjects: strings(&["Database", "TOC", "SE"]),
            timings: strings(&[
                "10:00 AM - 11:00 AM",
                "11:00 AM - 12:00 PM",
                "12:00 PM - 1:00 PM",
            ]),
            catalog: SubjectCatalog::default(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Config {
    /// Load the configuration. An explicit path must exist; otherwise the
    /// default path is used if present, and built-in defaults if not.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        let path: PathBuf = match path {
            Some(path) => {
                if !path.exists() {
                    return fail(format!("config file {} does not exist.", path.display()));
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !path.exists() {
                    log::debug!("No config file, using defaults.");
                    return Ok(Self::default());
                }
                path
            }
        };
        log::debug!("Loading config from {}", path.display());
        let content = read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Fallible<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let defaults = Self::default();
        let config = Self {
            service_url: file.service_url.unwrap_or(defaults.service_url),
            port: file.port.unwrap_or(defaults.port),
            open_browser: file.open_browser.unwrap_or(defaults.open_browser),
            default_filename: file.default_filename.unwrap_or(defaults.default_filename),
            download_dir: file.download_dir.or(defaults.download_dir),
            classes: file.classes.unwrap_or(defaults.classes),
            subjects: file.subjects.unwrap_or(defaults.subjects),
            timings: file.timings.unwrap_or(defaults.timings),
            catalog: file.catalog.unwrap_or(defaults.catalog),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        match Url::parse(&self.service_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return fail(format!(
                        "service_url must be an http(s) URL: {}",
                        self.service_url
                    ));
                }
            }
            Err(e) => {
                return fail(format!("invalid service_url {}: {e}", self.service_url));
            }
        }
        if self.default_filename.trim().is_empty() {
            return fail("default_filename is empty.");
        }
        for (name, options) in [
            ("classes", &self.classes),
            ("subjects", &self.subjects),
            ("timings", &self.timings),
        ] {
            if options.is_empty() {
                return fail(format!("{name} must not be empty."));
            }
        }
        self.catalog.validate()?;
        for subject in &self.subjects {
            if self.catalog.resolve(subject).is_err() {
                log::warn!("Subject '{subject}' is offered by the form but not in the catalog.");
            }
        }
        Ok(())
    }
}
