//! Thread-safe registry handle.
//!
//! Mutations (reload, remove) run one at a time under a single mutex. Lookups
//! only hold the lock long enough to grab the store and the current state
//! snapshot; the read and parse happen outside it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::index::{AuthIndex, AuthMode};
use crate::record::AuthRecord;
use crate::registry::{self, AuthSource, AuthStatus, IndexState, ReloadOutcome, Removal};

/// Clone is cheap - all clones share one registry.
#[derive(Debug, Clone)]
pub struct SharedAuthSource {
    inner: Arc<Mutex<AuthSource>>,
}

impl SharedAuthSource {
    pub fn new(source: AuthSource) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    // Reload swaps state in whole, so a poisoned lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, AuthSource> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> AuthMode {
        self.lock().mode()
    }

    pub fn reload(&self, force: bool) -> ReloadOutcome {
        self.lock().reload(force)
    }

    pub fn remove(&self, index: AuthIndex) -> Result<Removal> {
        self.lock().remove(index)
    }

    pub fn remove_raw(&self, raw: &str) -> Result<Removal> {
        self.lock().remove_raw(raw)
    }

    pub fn get_record(&self, index: AuthIndex) -> Option<AuthRecord> {
        let (store, state) = {
            let source = self.lock();
            (source.store(), source.snapshot())
        };
        registry::lookup(store.as_ref(), &state, index)
    }

    pub fn snapshot(&self) -> Arc<IndexState> {
        self.lock().snapshot()
    }

    pub fn status(&self) -> AuthStatus {
        let (mode, state) = {
            let source = self.lock();
            (source.mode(), source.snapshot())
        };
        registry::status_of(mode, &state)
    }
}

impl From<AuthSource> for SharedAuthSource {
    fn from(source: AuthSource) -> Self {
        Self::new(source)
    }
}
