//! Registry configuration.
//!
//! Names the backing directory and the naming scheme for environment
//! variables and files. Defaults match the standard deployment layout:
//! `AUTH_JSON_{N}` variables, or `configs/auth/auth-{N}.json` relative to the
//! working directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_AUTH_DIR: &str = "configs/auth";
const DEFAULT_ENV_PREFIX: &str = "AUTH_JSON_";
const DEFAULT_FILE_PREFIX: &str = "auth-";
const DEFAULT_FILE_EXTENSION: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSourceConfig {
    pub auth_dir: PathBuf,
    pub env_prefix: String,
    pub file_prefix: String,
    pub file_extension: String,
}

impl Default for AuthSourceConfig {
    fn default() -> Self {
        Self {
            auth_dir: PathBuf::from(DEFAULT_AUTH_DIR),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

impl AuthSourceConfig {
    pub fn with_auth_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.auth_dir = dir.into();
        self
    }
}
