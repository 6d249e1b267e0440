//! The credential source registry.
//!
//! `AuthSource` picks its backing store once at construction, then keeps three
//! views of it in sync: the discovered indices, the subset that validated, and
//! a display name per valid index. All of it lives in one `IndexState` that is
//! replaced wholesale on reload, so a snapshot taken by a reader is never
//! half-updated.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::AuthSourceConfig;
use crate::error::{AuthSourceError, Result};
use crate::index::{AuthIndex, AuthMode};
use crate::record::{AccountName, AuthRecord};
use crate::store::{EnvStore, FileStore, SourceStore};
use crate::validate::ValidationReport;

#[derive(Debug, Clone, Default)]
pub struct IndexState {
    /// Latest discovery result, ascending and deduplicated.
    pub discovered: Vec<AuthIndex>,
    /// Indices that passed validation, ascending. Always a subset of `discovered`.
    pub available: Vec<AuthIndex>,
    /// Display name per available index.
    pub names: BTreeMap<AuthIndex, AccountName>,
    /// Discovered set as of the last validation pass; `None` before the first.
    pub fingerprint: Option<Vec<AuthIndex>>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl IndexState {
    pub fn is_available(&self, index: AuthIndex) -> bool {
        self.available.binary_search(&index).is_ok()
    }

    /// Discovered indices that failed validation.
    pub fn invalid(&self) -> Vec<AuthIndex> {
        self.discovered
            .iter()
            .copied()
            .filter(|&i| !self.is_available(i))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Whether the validator ran on this reload.
    pub revalidated: bool,
    pub available: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Removal {
    pub remaining_accounts: usize,
    pub removed_index: AuthIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AccountDetail {
    pub index: AuthIndex,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub name: AccountName,
}

/// Snapshot for the status layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AuthStatus {
    pub mode: AuthMode,
    pub initial_indices: Vec<AuthIndex>,
    pub available_indices: Vec<AuthIndex>,
    pub invalid_indices: Vec<AuthIndex>,
    pub account_details: Vec<AccountDetail>,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub validated_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct AuthSource {
    store: Arc<dyn SourceStore>,
    state: Arc<IndexState>,
}

impl AuthSource {
    /// Select the mode from the process environment and load all sources.
    pub fn new(config: &AuthSourceConfig) -> Self {
        Self::select(EnvStore::from_process(&config.env_prefix), FileStore::new(config))
    }

    /// Environment mode if `env` has a startup variable, else file mode.
    pub fn select(env: EnvStore, files: FileStore) -> Self {
        if env.has_bootstrap_source() {
            info!("Detected AUTH_JSON_* environment variables, using environment variable authentication");
            Self::with_store(env)
        } else {
            info!(
                dir = %files.dir().display(),
                "No environment variable authentication detected, using credential files"
            );
            Self::with_store(files)
        }
    }

    /// Build a registry over an explicit store and run the initial load.
    pub fn with_store(store: impl SourceStore + 'static) -> Self {
        let mut source = Self {
            store: Arc::new(store),
            state: Arc::new(IndexState::default()),
        };
        source.reload(true);

        if source.state.available.is_empty() {
            warn!(
                mode = %source.mode(),
                "No valid credential sources found, starting in account binding mode"
            );
        }
        source
    }

    pub fn mode(&self) -> AuthMode {
        self.store.mode()
    }

    /// Re-scan the store, re-validating only when the discovered set changed
    /// since the last validation pass or when `force` is set.
    ///
    /// Content edits to an existing source do not change the discovered set
    /// and are only picked up by a forced reload.
    pub fn reload(&mut self, force: bool) -> ReloadOutcome {
        let previous = self.state.fingerprint.clone();
        let discovered = self.discover();
        let changed = previous.as_deref() != Some(discovered.as_slice());

        if !(force || changed) {
            debug!(discovered = discovered.len(), "Credential scan unchanged, skipping validation");
            return ReloadOutcome {
                revalidated: false,
                available: self.state.available.len(),
            };
        }

        info!("Credential scan detected changes, reloading and re-validating");
        let report = ValidationReport::run(self.store.as_ref(), &discovered);
        if let Some(diagnostic) = report.diagnostic() {
            warn!("{}, removed from the available list", diagnostic);
        }
        for (index, reason) in &report.invalid {
            debug!(index = %index, reason = %reason, "Credential source failed validation");
        }

        let available = report.available.len();
        info!(
            available = ?report.available,
            "Reload complete, {} valid sources available",
            available
        );

        self.state = Arc::new(IndexState {
            fingerprint: Some(discovered.clone()),
            discovered,
            available: report.available,
            names: report.names,
            validated_at: Some(Utc::now()),
        });

        ReloadOutcome {
            revalidated: true,
            available,
        }
    }

    /// Run discovery. A degraded store yields an empty set and clears the
    /// available indices immediately.
    fn discover(&mut self) -> Vec<AuthIndex> {
        match self.store.discover() {
            Ok(mut indices) => {
                indices.sort_unstable();
                indices.dedup();
                indices
            }
            Err(e) => {
                match &e {
                    AuthSourceError::SetupDegraded { source: None, .. } => {
                        warn!(error = %e, "Credential directory not found")
                    }
                    AuthSourceError::SetupDegraded { source: Some(cause), .. } => {
                        error!(error = %e, cause = %cause, "Failed to scan credential directory")
                    }
                    _ => error!(error = %e, "Failed to scan credential sources"),
                }
                let state = Arc::make_mut(&mut self.state);
                state.discovered.clear();
                state.available.clear();
                state.names.clear();
                Vec::new()
            }
        }
    }

    /// Delete the backing file for `index` and drop it from every index view.
    ///
    /// All-or-nothing: on any error the in-memory state is untouched.
    pub fn remove(&mut self, index: AuthIndex) -> Result<Removal> {
        self.ensure_file_mode()?;
        if !self.store.contains(index) {
            return Err(AuthSourceError::NotFound(index));
        }
        self.store.delete(index)?;

        let state = Arc::make_mut(&mut self.state);
        state.names.remove(&index);
        state.discovered.retain(|&i| i != index);
        state.available.retain(|&i| i != index);
        state.fingerprint = Some(state.discovered.clone());

        info!(index = %index, remaining = state.available.len(), "Removed credential source");
        Ok(Removal {
            remaining_accounts: state.available.len(),
            removed_index: index,
        })
    }

    /// `remove` for an index that has not been parsed yet.
    ///
    /// The mode is checked before the index, so environment mode always
    /// reports `ModeViolation`.
    pub fn remove_raw(&mut self, raw: &str) -> Result<Removal> {
        self.ensure_file_mode()?;
        let index = raw.parse()?;
        self.remove(index)
    }

    fn ensure_file_mode(&self) -> Result<()> {
        match self.mode() {
            AuthMode::File => Ok(()),
            mode => Err(AuthSourceError::ModeViolation { mode }),
        }
    }

    /// Read and parse the record for an available index. Never cached.
    pub fn get_record(&self, index: AuthIndex) -> Option<AuthRecord> {
        lookup(self.store.as_ref(), &self.state, index)
    }

    pub fn snapshot(&self) -> Arc<IndexState> {
        Arc::clone(&self.state)
    }

    pub fn discovered_indices(&self) -> &[AuthIndex] {
        &self.state.discovered
    }

    pub fn available_indices(&self) -> &[AuthIndex] {
        &self.state.available
    }

    pub fn invalid_indices(&self) -> Vec<AuthIndex> {
        self.state.invalid()
    }

    pub fn account_name(&self, index: AuthIndex) -> Option<&AccountName> {
        self.state.names.get(&index)
    }

    pub fn status(&self) -> AuthStatus {
        status_of(self.mode(), &self.state)
    }

    pub(crate) fn store(&self) -> Arc<dyn SourceStore> {
        Arc::clone(&self.store)
    }
}

pub(crate) fn lookup(store: &dyn SourceStore, state: &IndexState, index: AuthIndex) -> Option<AuthRecord> {
    if !state.is_available(index) {
        error!(index = %index, "Requested invalid or non-existent credential index");
        return None;
    }

    let content = match store.read(index) {
        Ok(content) => content,
        Err(e) => {
            error!(index = %index, error = %e, "Unable to retrieve credential content");
            return None;
        }
    };

    match AuthRecord::parse(&content) {
        Ok(record) => Some(record),
        Err(source) => {
            let e = AuthSourceError::RecordMalformed { index, source };
            error!(index = %index, error = %e, "Failed to parse credential content");
            None
        }
    }
}

pub(crate) fn status_of(mode: AuthMode, state: &IndexState) -> AuthStatus {
    AuthStatus {
        mode,
        initial_indices: state.discovered.clone(),
        available_indices: state.available.clone(),
        invalid_indices: state.invalid(),
        account_details: state
            .available
            .iter()
            .map(|&index| AccountDetail {
                index,
                name: state.names.get(&index).cloned().unwrap_or(AccountName::Unnamed),
            })
            .collect(),
        validated_at: state.validated_at,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory file-mode store that counts reads.
    #[derive(Debug, Default)]
    struct CountingStore {
        records: Mutex<BTreeMap<AuthIndex, String>>,
        reads: AtomicUsize,
    }

    impl CountingStore {
        fn with(records: &[(u32, &str)]) -> Self {
            let store = Self::default();
            for &(i, content) in records {
                store.put(i, content);
            }
            store
        }

        fn put(&self, index: u32, content: &str) {
            self.records
                .lock()
                .unwrap()
                .insert(AuthIndex::new(index), content.to_string());
        }
    }

    impl SourceStore for Arc<CountingStore> {
        fn mode(&self) -> AuthMode {
            AuthMode::File
        }

        fn discover(&self) -> Result<Vec<AuthIndex>> {
            Ok(self.records.lock().unwrap().keys().rev().copied().collect())
        }

        fn read(&self, index: AuthIndex) -> Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.records
                .lock()
                .unwrap()
                .get(&index)
                .cloned()
                .ok_or_else(|| AuthSourceError::RecordUnreadable {
                    index,
                    reason: "missing".to_string(),
                })
        }

        fn contains(&self, index: AuthIndex) -> bool {
            self.records.lock().unwrap().contains_key(&index)
        }

        fn delete(&self, index: AuthIndex) -> Result<()> {
            self.records
                .lock()
                .unwrap()
                .remove(&index)
                .map(|_| ())
                .ok_or(AuthSourceError::NotFound(index))
        }
    }

    fn idx(values: &[u32]) -> Vec<AuthIndex> {
        values.iter().copied().map(AuthIndex::new).collect()
    }

    #[test]
    fn test_initial_load_is_forced() {
        let store = Arc::new(CountingStore::with(&[(0, r#"{"accountName":"a"}"#), (1, "{}")]));
        let source = AuthSource::with_store(Arc::clone(&store));

        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
        assert_eq!(source.available_indices(), idx(&[0, 1]).as_slice());
        assert!(source.snapshot().validated_at.is_some());
    }

    #[test]
    fn test_unchanged_reload_reads_nothing() {
        let store = Arc::new(CountingStore::with(&[(0, "{}"), (3, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));
        let reads = store.reads.load(Ordering::SeqCst);

        let outcome = source.reload(false);
        assert!(!outcome.revalidated);
        assert_eq!(outcome.available, 2);
        assert_eq!(store.reads.load(Ordering::SeqCst), reads);
    }

    #[test]
    fn test_forced_reload_revalidates() {
        let store = Arc::new(CountingStore::with(&[(0, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));

        // Content edit without a set change is only seen on force
        store.put(0, "broken");
        assert!(!source.reload(false).revalidated);
        assert_eq!(source.available_indices(), idx(&[0]).as_slice());

        let outcome = source.reload(true);
        assert!(outcome.revalidated);
        assert_eq!(outcome.available, 0);
        assert_eq!(source.invalid_indices(), idx(&[0]));
    }

    #[test]
    fn test_new_source_triggers_revalidation() {
        let store = Arc::new(CountingStore::with(&[(0, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));

        store.put(2, r#"{"accountName":"new"}"#);
        let outcome = source.reload(false);
        assert!(outcome.revalidated);
        assert_eq!(source.available_indices(), idx(&[0, 2]).as_slice());
        assert_eq!(
            source.account_name(AuthIndex::new(2)),
            Some(&AccountName::Named("new".to_string()))
        );
    }

    #[test]
    fn test_remove_updates_all_views() {
        let store = Arc::new(CountingStore::with(&[(0, "{}"), (1, "bad"), (5, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));
        let before = source.available_indices().len();

        let removal = source.remove(AuthIndex::new(5)).unwrap();
        assert_eq!(removal.removed_index, AuthIndex::new(5));
        assert_eq!(removal.remaining_accounts, before - 1);
        assert_eq!(source.discovered_indices(), idx(&[0, 1]).as_slice());
        assert_eq!(source.available_indices(), idx(&[0]).as_slice());
        assert!(source.account_name(AuthIndex::new(5)).is_none());

        // The registry's own deletion is not a change
        assert!(!source.reload(false).revalidated);
    }

    #[test]
    fn test_remove_missing_leaves_state() {
        let store = Arc::new(CountingStore::with(&[(0, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));
        let before = source.status();

        let err = source.remove(AuthIndex::new(9)).unwrap_err();
        assert!(matches!(err, AuthSourceError::NotFound(i) if i == AuthIndex::new(9)));
        assert_eq!(source.status(), before);
    }

    #[test]
    fn test_readded_source_after_remove_is_revalidated() {
        let store = Arc::new(CountingStore::with(&[(0, "{}"), (1, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));
        source.remove(AuthIndex::new(1)).unwrap();

        store.put(1, r#"{"accountName":"back"}"#);
        assert!(source.reload(false).revalidated);
        assert_eq!(source.available_indices(), idx(&[0, 1]).as_slice());
    }

    #[test]
    fn test_snapshot_survives_removal() {
        let store = Arc::new(CountingStore::with(&[(0, "{}"), (1, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));
        let snapshot = source.snapshot();

        source.remove(AuthIndex::new(0)).unwrap();
        assert_eq!(snapshot.available, idx(&[0, 1]));
        assert_eq!(source.available_indices(), idx(&[1]).as_slice());
    }

    #[test]
    fn test_get_record_reads_fresh_content() {
        let store = Arc::new(CountingStore::with(&[(0, r#"{"accountName":"old"}"#)]));
        let source = AuthSource::with_store(Arc::clone(&store));

        store.put(0, r#"{"accountName":"fresh"}"#);
        let record = source.get_record(AuthIndex::new(0)).unwrap();
        assert_eq!(record.account_name().as_str(), "fresh");

        store.put(0, "not json anymore");
        assert!(source.get_record(AuthIndex::new(0)).is_none());
        assert!(source.get_record(AuthIndex::new(7)).is_none());
    }

    #[test]
    fn test_status_lists_invalid_and_names() {
        let store = Arc::new(CountingStore::with(&[(0, r#"{"accountName":"Alice"}"#), (1, "[]"), (2, "{}")]));
        let source = AuthSource::with_store(Arc::clone(&store));

        let status = source.status();
        assert_eq!(status.mode, AuthMode::File);
        assert_eq!(status.initial_indices, idx(&[0, 1, 2]));
        assert_eq!(status.available_indices, idx(&[0, 2]));
        assert_eq!(status.invalid_indices, idx(&[1]));

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["mode"], "file");
        assert_eq!(json["accountDetails"][0]["name"], "Alice");
        assert_eq!(json["accountDetails"][1]["name"], "N/A (unnamed)");
    }

    #[test]
    fn test_missing_dir_clears_sets() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("auth");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("auth-0.json"), "{}").unwrap();

        let mut source = AuthSource::with_store(FileStore::in_dir(&dir));
        assert_eq!(source.available_indices(), idx(&[0]).as_slice());

        std::fs::remove_dir_all(&dir).unwrap();
        source.reload(false);
        assert!(source.discovered_indices().is_empty());
        assert!(source.available_indices().is_empty());
        assert!(source.status().account_details.is_empty());
    }

    #[test]
    fn test_select_prefers_environment() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("auth-4.json"), "{}").unwrap();
        let files = FileStore::in_dir(temp_dir.path());

        let env = EnvStore::from_vars("AUTH_JSON_", [("AUTH_JSON_1", "{}")]);
        let source = AuthSource::select(env, files.clone());
        assert_eq!(source.mode(), AuthMode::Environment);
        assert_eq!(source.discovered_indices(), idx(&[1]).as_slice());

        let env = EnvStore::from_vars("AUTH_JSON_", [("AUTH_JSON_4", "{}")]);
        let source = AuthSource::select(env, files);
        assert_eq!(source.mode(), AuthMode::File);
        assert_eq!(source.discovered_indices(), idx(&[4]).as_slice());
    }

    #[test]
    fn test_environment_mode_rejects_removal() {
        let env = EnvStore::from_vars("AUTH_JSON_", [("AUTH_JSON_0", "{}")]);
        let mut source = AuthSource::with_store(env);

        for raw in ["0", "9", "not-a-number"] {
            let err = source.remove_raw(raw).unwrap_err();
            assert!(matches!(err, AuthSourceError::ModeViolation { .. }), "{raw}");
        }
        assert_eq!(source.available_indices(), idx(&[0]).as_slice());
    }

    #[test]
    fn test_remove_raw_rejects_bad_index() {
        let store = Arc::new(CountingStore::with(&[(0, "{}")]));
        let mut source = AuthSource::with_store(Arc::clone(&store));

        for raw in ["zero", " 0 ", "0\n"] {
            let err = source.remove_raw(raw).unwrap_err();
            assert!(matches!(err, AuthSourceError::InvalidIndex(_)), "{raw:?}");
        }
        assert!(store.contains(AuthIndex::new(0)));
        assert_eq!(source.remove_raw("0").unwrap().remaining_accounts, 0);
    }
}
