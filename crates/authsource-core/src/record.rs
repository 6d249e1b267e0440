//! Parsed credential records.
//!
//! A record is any JSON object. The only field the registry looks at is the
//! optional `accountName` string used for display.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field holding the human-readable account name.
const ACCOUNT_NAME_FIELD: &str = "accountName";

/// Shown when a record carries no usable account name.
const UNNAMED_LABEL: &str = "N/A (unnamed)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthRecord {
    fields: Map<String, Value>,
}

impl AuthRecord {
    /// Parse record content. Anything other than a JSON object is rejected.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        let fields: Map<String, Value> = serde_json::from_str(content)?;
        Ok(Self { fields })
    }

    pub fn account_name(&self) -> AccountName {
        match self.fields.get(ACCOUNT_NAME_FIELD) {
            Some(Value::String(name)) if !name.is_empty() => AccountName::Named(name.clone()),
            _ => AccountName::Unnamed,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Display name of an available account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountName {
    Named(String),
    Unnamed,
}

impl AccountName {
    pub fn as_str(&self) -> &str {
        match self {
            AccountName::Named(name) => name,
            AccountName::Unnamed => UNNAMED_LABEL,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, AccountName::Named(_))
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AccountName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_record() {
        let record = AuthRecord::parse(r#"{"accountName": "Alice", "cookies": []}"#).unwrap();
        assert_eq!(record.account_name(), AccountName::Named("Alice".to_string()));
        assert!(record.get("cookies").is_some());
        assert_eq!(record.fields().len(), 2);
    }

    #[test]
    fn test_missing_or_unusable_name_is_unnamed() {
        for content in [r#"{}"#, r#"{"accountName": ""}"#, r#"{"accountName": 42}"#] {
            let record = AuthRecord::parse(content).unwrap();
            assert_eq!(record.account_name(), AccountName::Unnamed, "{content}");
        }
        assert_eq!(AccountName::Unnamed.to_string(), "N/A (unnamed)");
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        for content in ["", "{", "[1, 2]", "42", "null", "\"text\""] {
            assert!(AuthRecord::parse(content).is_err(), "{content}");
        }
    }

    #[test]
    fn test_record_serializes_as_plain_object() {
        let record = AuthRecord::parse(r#"{"accountName":"Bob"}"#).unwrap();
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"accountName":"Bob"}"#);
        assert_eq!(
            serde_json::to_string(&AccountName::Named("Bob".to_string())).unwrap(),
            "\"Bob\""
        );
    }
}
