//! Read-only property snapshots.
//!
//! A [`PropertySnapshot`] is the already merged set of raw configuration
//! values that a mapping is built from. Keys are dotted names
//! (`graph.client-id`), collection elements use indexed keys
//! (`graph.scopes[0]`). Insertion order is preserved.
//!
//! # Examples
//!
//! ```rust
//! use config_mapping::PropertySnapshot;
//!
//! let snapshot = PropertySnapshot::new()
//!     .with("graph.tenant", "contoso")
//!     .with("graph.client-id", "id");
//!
//! assert_eq!(snapshot.get("graph.tenant"), Some("contoso"));
//! assert_eq!(snapshot.len(), 2);
//! ```

use std::collections::HashMap;

use crate::errors::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

/// Ordered, read-only mapping from dotted key to raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySnapshot {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl PropertySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, replacing the value of an existing key in place.
    ///
    /// Uses builder pattern for ergonomic chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    fn insert(&mut self, key: String, value: String) {
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Returns the raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds a snapshot from a TOML document.
    ///
    /// Tables become dotted keys and arrays become indexed keys, so
    ///
    /// ```toml
    /// [graph]
    /// tenant = "contoso"
    /// scopes = ["read", "write"]
    /// ```
    ///
    /// yields `graph.tenant`, `graph.scopes[0]` and `graph.scopes[1]`, in
    /// document order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ParseError` if the document is not valid TOML.
    pub fn from_toml_str(content: &str) -> ConfigurationResult<Self> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
                reason: e.to_string(),
            })?;

        let mut snapshot = Self::new();
        for (key, value) in &table {
            snapshot.flatten(key.clone(), value);
        }
        Ok(snapshot)
    }

    fn flatten(&mut self, key: String, value: &toml::Value) {
        match value {
            toml::Value::Table(table) => {
                for (child, value) in table {
                    self.flatten(format!("{}.{}", key, child), value);
                }
            }
            toml::Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.flatten(format!("{}[{}]", key, i), item);
                }
            }
            toml::Value::String(s) => self.insert(key, s.clone()),
            toml::Value::Integer(i) => self.insert(key, i.to_string()),
            toml::Value::Float(f) => self.insert(key, f.to_string()),
            toml::Value::Boolean(b) => self.insert(key, b.to_string()),
            toml::Value::Datetime(d) => self.insert(key, d.to_string()),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for PropertySnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (key, value) in iter {
            snapshot.insert(key.into(), value.into());
        }
        snapshot
    }
}
