//! Index and mode types shared by every part of the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthSourceError;

/// External identity of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct AuthIndex(u32);

impl AuthIndex {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parse a bare decimal digit group, as captured from a variable or file name.
    ///
    /// Leading zeros are accepted (`007` is index 7). Returns `None` for empty
    /// input, non-digits, or values that overflow `u32`.
    pub(crate) fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl From<u32> for AuthIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for AuthIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AuthIndex {
    type Err = AuthSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_digits(s).ok_or_else(|| AuthSourceError::InvalidIndex(s.to_string()))
    }
}

/// Which backing store the registry reads from. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub enum AuthMode {
    #[serde(rename = "env")]
    Environment,
    #[serde(rename = "file")]
    File,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Environment => "env",
            AuthMode::File => "file",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
