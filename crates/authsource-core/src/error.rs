use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::index::{AuthIndex, AuthMode};

pub type Result<T, E = AuthSourceError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum AuthSourceError {
    /// The backing directory is missing (`source` is `None`) or could not be listed.
    #[error("Credential directory {} is unavailable", path.display())]
    SetupDegraded {
        path: PathBuf,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Credential source #{index} is unreadable: {reason}")]
    RecordUnreadable { index: AuthIndex, reason: String },

    #[error("Credential source #{index} is malformed: {source}")]
    RecordMalformed {
        index: AuthIndex,
        #[source]
        source: serde_json::Error,
    },

    #[error("Account deletion is only supported in file mode (current mode: {mode})")]
    ModeViolation { mode: AuthMode },

    #[error("Invalid account index: {0:?}")]
    InvalidIndex(String),

    #[error("Credential source #{0} does not exist")]
    NotFound(AuthIndex),

    #[error("Failed to delete credential source #{index}: {source}")]
    DeletionFailed {
        index: AuthIndex,
        #[source]
        source: io::Error,
    },
}

impl AuthSourceError {
    /// Whether the failure came from the caller's request rather than storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthSourceError::ModeViolation { .. }
                | AuthSourceError::InvalidIndex(_)
                | AuthSourceError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(AuthSourceError::InvalidIndex("x".to_string()).is_client_error());
        assert!(AuthSourceError::NotFound(AuthIndex::new(3)).is_client_error());
        assert!(AuthSourceError::ModeViolation { mode: AuthMode::Environment }.is_client_error());

        let err = AuthSourceError::DeletionFailed {
            index: AuthIndex::new(1),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_display_messages() {
        let err = AuthSourceError::ModeViolation { mode: AuthMode::Environment };
        assert_eq!(
            err.to_string(),
            "Account deletion is only supported in file mode (current mode: env)"
        );
        assert_eq!(
            AuthSourceError::NotFound(AuthIndex::new(5)).to_string(),
            "Credential source #5 does not exist"
        );
    }
}
