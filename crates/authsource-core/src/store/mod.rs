//! Backing stores for credential records.
//!
//! A `SourceStore` knows how to enumerate candidate indices and fetch raw
//! record content for one index. It never parses content; that is the
//! validator's job.
//!
//! - `EnvStore`: `AUTH_JSON_{N}` environment variables (read-only)
//! - `FileStore`: `auth-{N}.json` files in a directory

pub mod env;
pub mod file;

pub use env::EnvStore;
pub use file::FileStore;

use std::fmt::Debug;

use crate::error::Result;
use crate::index::{AuthIndex, AuthMode};

pub trait SourceStore: Debug + Send + Sync {
    /// The mode this store backs.
    fn mode(&self) -> AuthMode;

    /// Enumerate every index that could hold a record, in any order.
    ///
    /// Fails with `SetupDegraded` when the store as a whole is unavailable.
    fn discover(&self) -> Result<Vec<AuthIndex>>;

    /// Fetch the raw content for one index. Fails with `RecordUnreadable`.
    fn read(&self, index: AuthIndex) -> Result<String>;

    /// Whether a backing artifact for `index` currently exists.
    fn contains(&self, index: AuthIndex) -> bool;

    /// Delete the backing artifact for `index`.
    fn delete(&self, index: AuthIndex) -> Result<()>;
}

/// Extract the index from `{prefix}{digits}{suffix}`, or `None` if `name` does
/// not have exactly that shape.
pub(crate) fn index_from_name(name: &str, prefix: &str, suffix: &str) -> Option<AuthIndex> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    AuthIndex::from_digits(digits)
}
