//! Core library for authsource.
//!
//! Discovers, validates, and serves credential records addressed by a small
//! integer index. Records come either from `AUTH_JSON_{N}` environment
//! variables or from `auth-{N}.json` files in a backing directory; the mode is
//! chosen once when the registry is constructed.
//!
//! - `AuthSource`: the registry (reload, removal, lookup, status)
//! - `SharedAuthSource`: mutex-guarded handle for hosts with concurrent callers
//! - `SourceStore`: backing store abstraction with `EnvStore` and `FileStore`

pub mod config;
pub mod error;
pub mod index;
pub mod record;
pub mod registry;
pub mod shared;
pub mod store;
pub mod validate;

pub use config::AuthSourceConfig;
pub use error::{AuthSourceError, Result};
pub use index::{AuthIndex, AuthMode};
pub use record::{AccountName, AuthRecord};
pub use registry::{AccountDetail, AuthSource, AuthStatus, IndexState, ReloadOutcome, Removal};
pub use shared::SharedAuthSource;
pub use store::{EnvStore, FileStore, SourceStore};
pub use validate::{InvalidReason, Validation, ValidationReport};
