use std::path::{Path, PathBuf};

use super::{index_from_name, SourceStore};
use crate::config::AuthSourceConfig;
use crate::error::{AuthSourceError, Result};
use crate::index::{AuthIndex, AuthMode};

/// Records stored as `{prefix}{N}.{extension}` files in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl FileStore {
    pub fn new(config: &AuthSourceConfig) -> Self {
        Self {
            dir: config.auth_dir.clone(),
            prefix: config.file_prefix.clone(),
            suffix: format!(".{}", config.file_extension),
        }
    }

    /// Store over `dir` with the default `auth-{N}.json` naming.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(&AuthSourceConfig::default().with_auth_dir(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self, index: AuthIndex) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }

    pub fn path_for(&self, index: AuthIndex) -> PathBuf {
        self.dir.join(self.file_name(index))
    }
}

impl SourceStore for FileStore {
    fn mode(&self) -> AuthMode {
        AuthMode::File
    }

    fn discover(&self) -> Result<Vec<AuthIndex>> {
        if !self.dir.exists() {
            return Err(AuthSourceError::SetupDegraded {
                path: self.dir.clone(),
                source: None,
            });
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| AuthSourceError::SetupDegraded {
            path: self.dir.clone(),
            source: Some(e),
        })?;

        let indices = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                index_from_name(name.to_str()?, &self.prefix, &self.suffix)
            })
            .collect();
        Ok(indices)
    }

    fn read(&self, index: AuthIndex) -> Result<String> {
        let path = self.path_for(index);
        if !path.exists() {
            return Err(AuthSourceError::RecordUnreadable {
                index,
                reason: format!("{} does not exist", path.display()),
            });
        }

        std::fs::read_to_string(&path).map_err(|e| AuthSourceError::RecordUnreadable {
            index,
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }

    fn contains(&self, index: AuthIndex) -> bool {
        self.path_for(index).exists()
    }

    fn delete(&self, index: AuthIndex) -> Result<()> {
        let path = self.path_for(index);
        if !path.exists() {
            return Err(AuthSourceError::NotFound(index));
        }
        std::fs::remove_file(&path).map_err(|source| AuthSourceError::DeletionFailed { index, source })
    }
}
