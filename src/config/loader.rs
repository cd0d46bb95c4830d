// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Configuration loading, saving, and timestamped backups.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use super::types::Config;
use crate::utils::expand_tilde;

/// Fatal configuration errors. The registry's address space cannot be
/// trusted after any of these, so the driver terminates the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Unwritable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Config {
    /// Load the configuration from a file. A missing file is an error:
    /// every command needs an address space to work against.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let expanded = expand_tilde(path);

        if !expanded.exists() {
            return Err(ConfigError::NotFound(expanded));
        }

        let content =
            fs::read_to_string(&expanded)
                .await
                .map_err(|source| ConfigError::Unreadable {
                    path: expanded.clone(),
                    source,
                })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: expanded.clone(),
                source,
            })?;

        Ok(config)
    }

    /// Save the configuration, writing a timestamped backup of the current
    /// file first so a bad write never destroys the only copy.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let expanded = expand_tilde(path);

        if expanded.exists() {
            let backup = backup_path(&expanded);
            fs::copy(&expanded, &backup)
                .await
                .map_err(|source| ConfigError::Unwritable {
                    path: backup.clone(),
                    source,
                })?;
            tracing::info!("config backed up to {}", backup.display());
        } else if let Some(parent) = expanded.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Unwritable {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Malformed {
            path: expanded.clone(),
            source,
        })?;

        fs::write(&expanded, json)
            .await
            .map_err(|source| ConfigError::Unwritable {
                path: expanded,
                source,
            })?;

        Ok(())
    }

    /// Default config path: `~/.config/sshm/config.json` (or the platform
    /// equivalent reported by the directories crate).
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "sshm") {
            return proj_dirs.config_dir().join("config.json");
        }
        expand_tilde(Path::new("~/.config/sshm/config.json"))
    }
}

/// Sibling backup file: `sshm-<YYYYmmddHHMMSS>.json` next to the config.
fn backup_path(config: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let dir = config.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("sshm-{stamp}.json"))
}
