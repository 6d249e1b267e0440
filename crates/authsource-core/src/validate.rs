//! Per-index validation of discovered sources.
//!
//! Every index is validated independently. A failure for one index is recorded
//! in the report and never stops the others from being checked.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::AuthSourceError;
use crate::index::AuthIndex;
use crate::record::{AccountName, AuthRecord};
use crate::store::SourceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// Content could not be fetched from the store.
    Unreadable(String),
    /// Content was fetched but is not a JSON object.
    Malformed(String),
}

#[derive(Debug, Clone)]
pub enum Validation {
    Valid { record: AuthRecord, name: AccountName },
    Invalid(InvalidReason),
}

impl Validation {
    pub fn check(store: &dyn SourceStore, index: AuthIndex) -> Self {
        let content = match store.read(index) {
            Ok(content) => content,
            Err(AuthSourceError::RecordUnreadable { reason, .. }) => {
                return Validation::Invalid(InvalidReason::Unreadable(reason))
            }
            Err(e) => return Validation::Invalid(InvalidReason::Unreadable(e.to_string())),
        };
        if content.is_empty() {
            return Validation::Invalid(InvalidReason::Unreadable("content is empty".to_string()));
        }

        match AuthRecord::parse(&content) {
            Ok(record) => {
                let name = record.account_name();
                Validation::Valid { record, name }
            }
            Err(e) => Validation::Invalid(InvalidReason::Malformed(e.to_string())),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid { .. })
    }
}

/// Result of validating a whole discovered set.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Valid indices, ascending.
    pub available: Vec<AuthIndex>,
    pub names: BTreeMap<AuthIndex, AccountName>,
    pub invalid: Vec<(AuthIndex, InvalidReason)>,
}

impl ValidationReport {
    /// Validate each of `discovered` against `store`. An empty set reads nothing.
    pub fn run(store: &dyn SourceStore, discovered: &[AuthIndex]) -> Self {
        let mut report = Self::default();

        for &index in discovered {
            match Validation::check(store, index) {
                Validation::Valid { name, .. } => {
                    report.available.push(index);
                    report.names.insert(index, name);
                }
                Validation::Invalid(reason) => report.invalid.push((index, reason)),
            }
        }

        report.available.sort_unstable();
        report.available.dedup();
        report
    }

    /// One-line summary of every invalid source, or `None` if all passed.
    pub fn diagnostic(&self) -> Option<String> {
        if self.invalid.is_empty() {
            return None;
        }
        let labels: Vec<String> = self
            .invalid
            .iter()
            .map(|(index, reason)| source_label(*index, reason))
            .collect();
        Some(format!(
            "{} credential sources failed validation (format errors or unreadable): [{}]",
            self.invalid.len(),
            labels.join(", ")
        ))
    }
}

fn source_label(index: AuthIndex, reason: &InvalidReason) -> String {
    match reason {
        InvalidReason::Malformed(_) => format!("auth-{}", index),
        InvalidReason::Unreadable(_) => format!("auth-{} (unreadable)", index),
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Unreadable(reason) => write!(f, "unreadable: {}", reason),
            InvalidReason::Malformed(reason) => write!(f, "format error: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EnvStore;

    fn store() -> EnvStore {
        EnvStore::from_vars(
            "AUTH_JSON_",
            [
                ("AUTH_JSON_0", r#"{"accountName":"Alice"}"#),
                ("AUTH_JSON_1", "{not json"),
                ("AUTH_JSON_2", r#"{"token":"abc"}"#),
                ("AUTH_JSON_3", ""),
            ],
        )
    }

    #[test]
    fn test_check_classifies_each_source() {
        let store = store();
        assert!(matches!(
            Validation::check(&store, AuthIndex::new(0)),
            Validation::Valid { name: AccountName::Named(ref n), .. } if n == "Alice"
        ));
        assert!(matches!(
            Validation::check(&store, AuthIndex::new(1)),
            Validation::Invalid(InvalidReason::Malformed(_))
        ));
        assert!(matches!(
            Validation::check(&store, AuthIndex::new(9)),
            Validation::Invalid(InvalidReason::Unreadable(_))
        ));
    }

    #[test]
    fn test_empty_content_is_unreadable() {
        let store = store();
        assert!(matches!(
            Validation::check(&store, AuthIndex::new(3)),
            Validation::Invalid(InvalidReason::Unreadable(_))
        ));

        let report = ValidationReport::run(&store, &[AuthIndex::new(3)]);
        assert!(report.diagnostic().unwrap().contains("[auth-3 (unreadable)]"));
    }

    #[test]
    fn test_report_partitions_and_sorts() {
        let store = store();
        let discovered = [2, 9, 1, 0].map(AuthIndex::new);
        let report = ValidationReport::run(&store, &discovered);

        assert_eq!(report.available, vec![AuthIndex::new(0), AuthIndex::new(2)]);
        assert_eq!(report.names.len(), 2);
        assert_eq!(report.names[&AuthIndex::new(2)], AccountName::Unnamed);
        assert_eq!(report.invalid.len(), 2);

        let diagnostic = report.diagnostic().unwrap();
        assert!(diagnostic.starts_with("2 credential sources"));
        assert!(diagnostic.contains("[auth-9 (unreadable), auth-1]"));
    }

    #[test]
    fn test_all_valid_has_no_diagnostic() {
        let store = store();
        let report = ValidationReport::run(&store, &[AuthIndex::new(0)]);
        assert!(report.diagnostic().is_none());

        let empty = ValidationReport::run(&store, &[]);
        assert!(empty.available.is_empty());
        assert!(empty.names.is_empty());
    }
}
