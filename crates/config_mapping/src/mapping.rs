//! Resolved mappings.
//!
//! A [`ResolvedMapping`] is the immutable result of a successful build. It is
//! cheap to clone and can be shared freely across threads. Two mappings
//! compare equal when they hold the same members with equal values.
//!
//! # Examples
//!
//! ```rust
//! use config_mapping::{MappingDescriptor, MappingEngine, MemberDescriptor, PropertySnapshot, ScalarType};
//!
//! let descriptor = MappingDescriptor::builder("Server", "server")
//!     .member(MemberDescriptor::single("host", ScalarType::String))
//!     .member(MemberDescriptor::single("port", ScalarType::U16))
//!     .build()?;
//! let snapshot = PropertySnapshot::new()
//!     .with("server.host", "localhost")
//!     .with("server.port", "8080");
//!
//! let mapping = MappingEngine::new().build(&descriptor, "server", &snapshot)?;
//! let port: u16 = mapping.value("port")?;
//! assert_eq!(port, 8080);
//! # Ok::<(), config_mapping::ConfigurationError>(())
//! ```

use std::sync::Arc;

use crate::descriptor::{join_key, MappingDescriptor};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::snapshot::PropertySnapshot;
use crate::value::{FromValue, Value};

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;

/// A Rust type that can be produced from a resolved mapping.
///
/// The descriptor is built once per type and prefix and then kept by the
/// engine's registry, see [`crate::MappingEngine::mapping`].
pub trait ConfigMapping: Sized + 'static {
    /// Prefix used by [`crate::MappingEngine::mapping`].
    const PREFIX: &'static str;

    /// Describes the members of the mapping.
    fn descriptor() -> ConfigurationResult<MappingDescriptor>;

    /// Reads the typed fields out of a resolved mapping.
    fn from_mapping(mapping: &ResolvedMapping) -> ConfigurationResult<Self>;
}

/// One resolved member.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    /// Declared member name.
    pub name: String,
    /// Key segment relative to the mapping prefix.
    pub segment: String,
    /// Full dotted key.
    pub key: String,
    pub value: Value,
}

#[derive(Debug, PartialEq)]
struct MappingData {
    type_name: String,
    prefix: String,
    members: Vec<ResolvedMember>,
}

/// Immutable, fully populated mapping instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    inner: Arc<MappingData>,
}

impl ResolvedMapping {
    pub(crate) fn new(type_name: &str, prefix: &str, members: Vec<ResolvedMember>) -> Self {
        Self {
            inner: Arc::new(MappingData {
                type_name: type_name.to_string(),
                prefix: prefix.to_string(),
                members,
            }),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[ResolvedMember] {
        &self.inner.members
    }

    pub fn len(&self) -> usize {
        self.inner.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.members.is_empty()
    }

    /// Returns a member's value, by declared name or key segment.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner
            .members
            .iter()
            .find(|m| m.name == name || m.segment == name)
            .map(|m| &m.value)
    }

    /// Returns a member's value converted to `T`.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::UnknownMember` if there is no such member
    /// * `ConfigurationError::TypeMismatch` if the value is not a `T`
    pub fn value<T: FromValue>(&self, name: &str) -> ConfigurationResult<T> {
        let value = self.require(name)?;
        T::from_value(value).ok_or_else(|| ConfigurationError::TypeMismatch {
            member: name.to_string(),
            expected: T::type_label(),
            actual: value.kind().to_string(),
        })
    }

    /// Borrows a composite member as its constructed type.
    pub fn composite<T: 'static>(&self, name: &str) -> ConfigurationResult<&T> {
        let value = self.require(name)?;
        match value {
            Value::Composite(composite) => {
                composite
                    .downcast_ref::<T>()
                    .ok_or_else(|| ConfigurationError::TypeMismatch {
                        member: name.to_string(),
                        expected: std::any::type_name::<T>().to_string(),
                        actual: composite.type_name().to_string(),
                    })
            }
            other => Err(ConfigurationError::TypeMismatch {
                member: name.to_string(),
                expected: std::any::type_name::<T>().to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }

    /// Borrows the elements of a sequence of composites.
    pub fn composites<T: 'static>(&self, name: &str) -> ConfigurationResult<Vec<&T>> {
        let value = self.require(name)?;
        let items = value
            .as_list()
            .ok_or_else(|| ConfigurationError::TypeMismatch {
                member: name.to_string(),
                expected: "list".to_string(),
                actual: value.kind().to_string(),
            })?;

        items
            .iter()
            .map(|item| match item {
                Value::Composite(composite) => composite.downcast_ref::<T>(),
                _ => None,
            })
            .collect::<Option<Vec<&T>>>()
            .ok_or_else(|| ConfigurationError::TypeMismatch {
                member: name.to_string(),
                expected: format!("list of {}", std::any::type_name::<T>()),
                actual: "list".to_string(),
            })
    }

    fn require(&self, name: &str) -> ConfigurationResult<&Value> {
        self.get(name).ok_or_else(|| ConfigurationError::UnknownMember {
            member: name.to_string(),
        })
    }

    /// Encodes the mapping back into raw properties.
    ///
    /// Sequences are written as indexed keys, map entries as `key.<name>`,
    /// and absent optionals are left out. Building the same descriptor from
    /// the result yields an equal mapping.
    pub fn to_snapshot(&self) -> PropertySnapshot {
        let mut entries = Vec::new();
        self.collect_entries(&mut entries);
        entries.into_iter().collect()
    }

    fn collect_entries(&self, entries: &mut Vec<(String, String)>) {
        for member in self.members() {
            match &member.value {
                Value::List(items) => {
                    for (i, item) in items.iter().enumerate() {
                        encode_entry(format!("{}[{}]", member.key, i), item, entries);
                    }
                }
                Value::Map(map) => {
                    for (name, item) in map {
                        encode_entry(join_key(&member.key, name), item, entries);
                    }
                }
                value => encode_entry(member.key.clone(), value, entries),
            }
        }
    }

    /// Renders the mapping as a JSON object keyed by key segment.
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .members()
            .iter()
            .map(|m| (m.segment.clone(), m.value.to_json()))
            .collect::<serde_json::Map<String, serde_json::Value>>();
        serde_json::Value::Object(object)
    }
}

fn encode_entry(key: String, value: &Value, entries: &mut Vec<(String, String)>) {
    match value {
        Value::Group(group) => group.collect_entries(entries),
        value => {
            if let Some(raw) = value.to_raw() {
                entries.push((key, raw));
            }
        }
    }
}
