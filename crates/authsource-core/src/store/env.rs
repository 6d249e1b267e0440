use std::collections::BTreeMap;

use tracing::debug;

use super::{index_from_name, SourceStore};
use crate::error::{AuthSourceError, Result};
use crate::index::{AuthIndex, AuthMode};

/// Indices whose presence at startup selects environment mode.
const BOOTSTRAP_INDICES: [u32; 2] = [0, 1];

#[derive(Debug, Clone)]
enum Vars {
    /// Read the live process environment on every call.
    Process,
    /// A fixed snapshot of variables.
    Fixed(BTreeMap<String, String>),
}

/// Records stored as raw JSON in `{prefix}{N}` environment variables.
#[derive(Debug, Clone)]
pub struct EnvStore {
    prefix: String,
    vars: Vars,
}

impl EnvStore {
    pub fn from_process(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: Vars::Process,
        }
    }

    /// Build a store over a fixed set of variables instead of the process environment.
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            vars: Vars::Fixed(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn var_name(&self, index: AuthIndex) -> String {
        format!("{}{}", self.prefix, index)
    }

    /// Whether any startup variable (index 0 or 1) is set.
    pub fn has_bootstrap_source(&self) -> bool {
        BOOTSTRAP_INDICES
            .iter()
            .any(|&i| self.lookup(&self.var_name(AuthIndex::new(i))).is_some())
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match &self.vars {
            Vars::Process => std::env::var(name).ok(),
            Vars::Fixed(map) => map.get(name).cloned(),
        }
    }

    fn names(&self) -> Vec<String> {
        match &self.vars {
            // vars_os: std::env::vars panics on non-unicode entries
            Vars::Process => std::env::vars_os()
                .filter_map(|(k, _)| k.into_string().ok())
                .collect(),
            Vars::Fixed(map) => map.keys().cloned().collect(),
        }
    }
}

impl SourceStore for EnvStore {
    fn mode(&self) -> AuthMode {
        AuthMode::Environment
    }

    fn discover(&self) -> Result<Vec<AuthIndex>> {
        let mut indices = Vec::new();
        for name in self.names() {
            if !name.starts_with(&self.prefix) {
                continue;
            }
            match index_from_name(&name, &self.prefix, "") {
                Some(index) => indices.push(index),
                None => debug!(variable = %name, "Ignoring variable without a valid index suffix"),
            }
        }
        Ok(indices)
    }

    fn read(&self, index: AuthIndex) -> Result<String> {
        let name = self.var_name(index);
        self.lookup(&name)
            .ok_or_else(|| AuthSourceError::RecordUnreadable {
                index,
                reason: format!("variable {} is not set", name),
            })
    }

    fn contains(&self, index: AuthIndex) -> bool {
        self.lookup(&self.var_name(index)).is_some()
    }

    fn delete(&self, _index: AuthIndex) -> Result<()> {
        Err(AuthSourceError::ModeViolation {
            mode: AuthMode::Environment,
        })
    }
}
