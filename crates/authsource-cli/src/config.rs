//! CLI configuration management.
//!
//! Wraps the registry configuration with settings that only matter to the
//! command-line tool. Stored at `~/.config/authsource/config.json`; a missing
//! file means all defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use authsource_core::AuthSourceConfig;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "authsource";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub source: AuthSourceConfig,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
