//! Binding of sequence members.
//!
//! A sequence can be configured in two ways:
//!
//! * indexed keys `base[0]`, `base[1]`, ... read contiguously from zero up to
//!   the first missing index, one element per key
//! * a single comma separated value at `base`, where `\,` is a literal comma
//!
//! When both are present the indexed keys win. Empty elements are skipped in
//! both forms, and a sequence without any element is reported as absent so
//! that the caller can fall back to a default.
//!
//! Sequences of nested mappings are always indexed (`base[0].name`), and map
//! members collect every key below `base.`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::coercion::coerce;
use crate::errors::CoercionError;
use crate::snapshot::PropertySnapshot;
use crate::value::{Value, ValueType};

#[cfg(test)]
#[path = "collections_tests.rs"]
mod tests;

/// Binds the sequence stored under `base_key`.
///
/// Returns `Ok(None)` when neither addressing form yields an element.
///
/// # Errors
///
/// Returns the coercion error of the first element that cannot be converted.
///
/// # Examples
///
/// ```rust
/// use config_mapping::{bind_sequence, PropertySnapshot, ScalarType, Value};
///
/// let snapshot = PropertySnapshot::new()
///     .with("pets", "cat,lama")
///     .with("pets[0]", "dog");
///
/// let pets = bind_sequence(&snapshot, "pets", &ScalarType::String.into())?;
/// assert_eq!(pets, Some(vec![Value::String("dog".to_string())]));
/// # Ok::<(), config_mapping::CoercionError>(())
/// ```
pub fn bind_sequence(
    snapshot: &PropertySnapshot,
    base_key: &str,
    element: &ValueType,
) -> Result<Option<Vec<Value>>, CoercionError> {
    let indexed = indexed_values(snapshot, base_key);
    let raw_items: Vec<String> = if !indexed.is_empty() {
        debug!(
            key = base_key,
            count = indexed.len(),
            "Binding sequence from indexed keys"
        );
        indexed
            .into_iter()
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    } else if let Some(raw) = snapshot.get(base_key) {
        debug!(key = base_key, "Binding sequence from comma separated value");
        split_list(raw)
    } else {
        Vec::new()
    };

    if raw_items.is_empty() {
        return Ok(None);
    }

    coerce_items(&raw_items, element).map(Some)
}

/// Converts a literal sequence default.
///
/// Unlike configured values an empty literal is a valid, empty sequence.
pub fn parse_sequence(raw: &str, element: &ValueType) -> Result<Vec<Value>, CoercionError> {
    coerce_items(&split_list(raw), element)
}

fn coerce_items(items: &[String], element: &ValueType) -> Result<Vec<Value>, CoercionError> {
    items.iter().map(|item| coerce(item, element)).collect()
}

fn indexed_values<'a>(snapshot: &'a PropertySnapshot, base_key: &str) -> Vec<&'a str> {
    (0..)
        .map(|i| snapshot.get(&format!("{}[{}]", base_key, i)))
        .take_while(Option::is_some)
        .flatten()
        .collect()
}

/// Number of nested mappings configured under `base[0]`, `base[1]`, ...
///
/// An index counts when any key starts with `base[i].`. Counting stops at the
/// first index with no keys.
pub fn indexed_group_count(snapshot: &PropertySnapshot, base_key: &str) -> usize {
    (0..)
        .take_while(|i| {
            let element = format!("{}[{}].", base_key, i);
            snapshot.iter().any(|(key, _)| key.starts_with(&element))
        })
        .count()
}

/// Binds a map of single values stored under `base_key`.
///
/// The map key is everything after `base.`, so `server.port` below `server`
/// has key `port` and `server.tls.port` has key `tls.port`. Empty values are
/// skipped.
///
/// # Errors
///
/// Returns the coercion error of the first entry that cannot be converted.
///
/// # Examples
///
/// ```rust
/// use config_mapping::{bind_map, PropertySnapshot, ScalarType, Value};
///
/// let snapshot = PropertySnapshot::new()
///     .with("labels.team", "core")
///     .with("labels.tier", "gold");
///
/// let labels = bind_map(&snapshot, "labels", &ScalarType::String.into())?;
/// assert_eq!(labels.get("team"), Some(&Value::String("core".to_string())));
/// # Ok::<(), config_mapping::CoercionError>(())
/// ```
pub fn bind_map(
    snapshot: &PropertySnapshot,
    base_key: &str,
    element: &ValueType,
) -> Result<BTreeMap<String, Value>, CoercionError> {
    let entries: Vec<(&str, &str)> = snapshot
        .iter()
        .filter_map(|(key, raw)| map_suffix(key, base_key).map(|suffix| (suffix, raw)))
        .filter(|(suffix, raw)| !suffix.is_empty() && !raw.is_empty())
        .collect();
    debug!(key = base_key, count = entries.len(), "Binding map entries");

    entries
        .into_iter()
        .map(|(suffix, raw)| coerce(raw, element).map(|value| (suffix.to_string(), value)))
        .collect()
}

/// Names of the nested mappings configured under `base.<name>.`, sorted.
pub fn map_group_names(snapshot: &PropertySnapshot, base_key: &str) -> Vec<String> {
    snapshot
        .iter()
        .filter_map(|(key, _)| map_suffix(key, base_key))
        .filter_map(|suffix| suffix.split_once('.').map(|(name, _)| name))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn map_suffix<'a>(key: &'a str, base_key: &str) -> Option<&'a str> {
    if base_key.is_empty() {
        Some(key)
    } else {
        key.strip_prefix(base_key)?.strip_prefix('.')
    }
}

/// Splits a comma separated value.
///
/// A backslash escapes the next character, so `a\,b,c` yields `a,b` and `c`.
/// Empty items are dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            ',' => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }

    items
}

/// Encodes list items back to a comma separated value.
pub fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.replace('\\', "\\\\").replace(',', "\\,"))
        .collect::<Vec<_>>()
        .join(",")
}
