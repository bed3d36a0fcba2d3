//! Mapping and member descriptors.
//!
//! A [`MappingDescriptor`] describes one mapping type: its name, default
//! prefix, naming strategy and the ordered list of members. Descriptors are
//! immutable once built. Key segments are derived when the descriptor is
//! built, so the engine never re-derives names during resolution.
//!
//! # Examples
//!
//! ```rust
//! use config_mapping::{DefaultValue, MappingDescriptor, MemberDescriptor, ScalarType};
//!
//! let descriptor = MappingDescriptor::builder("GraphOption", "graph")
//!     .member(MemberDescriptor::single("getBaseUrl", ScalarType::String)
//!         .with_default(DefaultValue::literal("url")))
//!     .member(MemberDescriptor::single("getTenant", ScalarType::String))
//!     .member(MemberDescriptor::single("getClientId", ScalarType::String))
//!     .build()?;
//!
//! let keys: Vec<&str> = descriptor.members().iter().map(|m| m.key()).collect();
//! assert_eq!(keys, vec!["base-url", "tenant", "client-id"]);
//! # Ok::<(), config_mapping::ConfigurationError>(())
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::defaults::DefaultValue;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::property_name::{property_name, NamingStrategy};
use crate::value::{Value, ValueType};

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;

/// Shape of a member's value.
#[derive(Debug, Clone)]
pub enum MemberKind {
    /// Exactly one value; required unless a default is declared.
    Single(ValueType),
    /// An ordered sequence of values.
    Sequence(ValueType),
    /// One value that may be absent.
    Optional(ValueType),
    /// A sequence that may be absent.
    OptionalSequence(ValueType),
    /// Values keyed by everything after `prefix.key.`.
    Map(ValueType),
    /// A nested mapping resolved under `prefix.key`.
    Group(Arc<MappingDescriptor>),
    /// Nested mappings resolved under `prefix.key[0]`, `prefix.key[1]`, ...
    GroupSequence(Arc<MappingDescriptor>),
    /// A sequence of nested mappings that may be absent.
    OptionalGroupSequence(Arc<MappingDescriptor>),
    /// Nested mappings resolved under `prefix.key.<name>` for every name found.
    GroupMap(Arc<MappingDescriptor>),
}

impl MemberKind {
    /// Human readable type name used in error reports.
    pub fn type_name(&self) -> String {
        match self {
            MemberKind::Single(value_type) => value_type.name().to_string(),
            MemberKind::Sequence(value_type) => format!("list of {}", value_type.name()),
            MemberKind::Optional(value_type) => format!("optional {}", value_type.name()),
            MemberKind::OptionalSequence(value_type) => {
                format!("optional list of {}", value_type.name())
            }
            MemberKind::Map(value_type) => format!("map of {}", value_type.name()),
            MemberKind::Group(descriptor) => descriptor.type_name().to_string(),
            MemberKind::GroupSequence(descriptor) => {
                format!("list of {}", descriptor.type_name())
            }
            MemberKind::OptionalGroupSequence(descriptor) => {
                format!("optional list of {}", descriptor.type_name())
            }
            MemberKind::GroupMap(descriptor) => format!("map of {}", descriptor.type_name()),
        }
    }

    /// The nested descriptor of a group kind.
    pub fn group(&self) -> Option<&Arc<MappingDescriptor>> {
        match self {
            MemberKind::Group(descriptor)
            | MemberKind::GroupSequence(descriptor)
            | MemberKind::OptionalGroupSequence(descriptor)
            | MemberKind::GroupMap(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Whether the kind resolves to [`Value::Absent`] when nothing is configured.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            MemberKind::Optional(_)
                | MemberKind::OptionalSequence(_)
                | MemberKind::OptionalGroupSequence(_)
        )
    }

    /// Whether `value` has the shape and element types of this kind.
    ///
    /// Group kinds never admit a value; they are only built from properties.
    pub fn admits(&self, value: &Value) -> bool {
        let all = |items: &[Value], element: &ValueType| items.iter().all(|v| element.admits(v));
        match (self, value) {
            (MemberKind::Optional(_) | MemberKind::OptionalSequence(_), Value::Absent) => true,
            (MemberKind::Single(element) | MemberKind::Optional(element), value) => {
                element.admits(value)
            }
            (
                MemberKind::Sequence(element) | MemberKind::OptionalSequence(element),
                Value::List(items),
            ) => all(items, element),
            (MemberKind::Map(element), Value::Map(entries)) => {
                entries.values().all(|v| element.admits(v))
            }
            _ => false,
        }
    }
}

/// A single declared member of a mapping.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    name: String,
    override_name: Option<String>,
    accessor: bool,
    kind: MemberKind,
    default: Option<DefaultValue>,
    key: String,
}

impl MemberDescriptor {
    /// Creates a member of the given kind.
    ///
    /// Members are nullary accessors by default, so a `get` prefix is stripped.
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            override_name: None,
            accessor: true,
            kind,
            default: None,
            key: String::new(),
        }
    }

    pub fn single(name: impl Into<String>, value_type: impl Into<ValueType>) -> Self {
        Self::new(name, MemberKind::Single(value_type.into()))
    }

    pub fn sequence(name: impl Into<String>, element: impl Into<ValueType>) -> Self {
        Self::new(name, MemberKind::Sequence(element.into()))
    }

    pub fn optional(name: impl Into<String>, value_type: impl Into<ValueType>) -> Self {
        Self::new(name, MemberKind::Optional(value_type.into()))
    }

    pub fn group(name: impl Into<String>, descriptor: MappingDescriptor) -> Self {
        Self::new(name, MemberKind::Group(Arc::new(descriptor)))
    }

    pub fn optional_sequence(name: impl Into<String>, element: impl Into<ValueType>) -> Self {
        Self::new(name, MemberKind::OptionalSequence(element.into()))
    }

    pub fn map(name: impl Into<String>, value_type: impl Into<ValueType>) -> Self {
        Self::new(name, MemberKind::Map(value_type.into()))
    }

    pub fn group_sequence(name: impl Into<String>, descriptor: MappingDescriptor) -> Self {
        Self::new(name, MemberKind::GroupSequence(Arc::new(descriptor)))
    }

    pub fn optional_group_sequence(name: impl Into<String>, descriptor: MappingDescriptor) -> Self {
        Self::new(name, MemberKind::OptionalGroupSequence(Arc::new(descriptor)))
    }

    pub fn group_map(name: impl Into<String>, descriptor: MappingDescriptor) -> Self {
        Self::new(name, MemberKind::GroupMap(Arc::new(descriptor)))
    }

    /// Uses `key` verbatim as the key segment.
    pub fn with_name(mut self, key: impl Into<String>) -> Self {
        self.override_name = Some(key.into());
        self
    }

    /// Marks the member as taking parameters, which keeps a `get` prefix.
    pub fn with_parameters(mut self) -> Self {
        self.accessor = false;
        self
    }

    /// Declares the member's default. Replaces any earlier default.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Declared member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derived key segment, relative to the mapping prefix.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Whether a member fails when nothing is configured for it.
    ///
    /// Sequences count as required: without a default an unconfigured
    /// sequence is an error, not an empty list. Maps resolve to an empty map.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && matches!(
                self.kind,
                MemberKind::Single(_) | MemberKind::Sequence(_) | MemberKind::GroupSequence(_)
            )
    }

    /// Matches a declared name or a key segment.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.key == name
    }
}

/// Immutable description of a mapping type.
#[derive(Debug, Clone)]
pub struct MappingDescriptor {
    type_name: String,
    prefix: String,
    naming_strategy: NamingStrategy,
    members: Vec<MemberDescriptor>,
}

impl MappingDescriptor {
    /// Starts a descriptor for `type_name` with the default `prefix`.
    pub fn builder(type_name: impl Into<String>, prefix: impl Into<String>) -> MappingDescriptorBuilder {
        MappingDescriptorBuilder {
            type_name: type_name.into(),
            prefix: prefix.into(),
            naming_strategy: NamingStrategy::default(),
            members: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Prefix used when the mapping is built without an explicit one.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn naming_strategy(&self) -> NamingStrategy {
        self.naming_strategy
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Position of a member, by declared name or key segment.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.answers_to(name))
    }

    /// Full keys of every leaf member under `prefix`, nested groups expanded.
    ///
    /// Map keys are shown as `*` and sequence indexes as `[*]`.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        for member in &self.members {
            let key = join_key(prefix, member.key());
            match member.kind() {
                MemberKind::Group(group) => keys.extend(group.keys(&key)),
                MemberKind::GroupSequence(group) | MemberKind::OptionalGroupSequence(group) => {
                    keys.extend(group.keys(&format!("{}[*]", key)))
                }
                MemberKind::GroupMap(group) => keys.extend(group.keys(&join_key(&key, "*"))),
                MemberKind::Map(_) => keys.push(join_key(&key, "*")),
                _ => keys.push(key),
            }
        }
        keys
    }
}

/// Builder for [`MappingDescriptor`].
#[derive(Debug)]
pub struct MappingDescriptorBuilder {
    type_name: String,
    prefix: String,
    naming_strategy: NamingStrategy,
    members: Vec<MemberDescriptor>,
}

impl MappingDescriptorBuilder {
    pub fn naming_strategy(mut self, strategy: NamingStrategy) -> Self {
        self.naming_strategy = strategy;
        self
    }

    /// Appends a member. Declaration order is resolution order.
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Derives key segments and validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidDeclaration` if:
    /// - The type name is empty
    /// - A member name is empty
    /// - Two members derive the same key segment
    /// - A group or map member declares a default
    pub fn build(self) -> ConfigurationResult<MappingDescriptor> {
        if self.type_name.trim().is_empty() {
            return Err(ConfigurationError::InvalidDeclaration {
                field: "type_name".to_string(),
                reason: "Mapping type name cannot be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(self.members.len());
        for mut member in self.members {
            if member.name.is_empty() {
                return Err(ConfigurationError::InvalidDeclaration {
                    field: format!("{}.members", self.type_name),
                    reason: "Member name cannot be empty".to_string(),
                });
            }

            if member.default.is_some() {
                if member.kind.group().is_some() {
                    return Err(ConfigurationError::InvalidDeclaration {
                        field: format!("{}.{}", self.type_name, member.name),
                        reason: "Group members cannot declare a default".to_string(),
                    });
                }
                if matches!(member.kind, MemberKind::Map(_)) {
                    return Err(ConfigurationError::InvalidDeclaration {
                        field: format!("{}.{}", self.type_name, member.name),
                        reason: "Map members cannot declare a default".to_string(),
                    });
                }
            }

            member.key = property_name(
                &member.name,
                member.override_name.as_deref(),
                member.accessor,
                self.naming_strategy,
            );

            if !seen.insert(member.key.clone()) {
                return Err(ConfigurationError::InvalidDeclaration {
                    field: format!("{}.{}", self.type_name, member.name),
                    reason: format!("Key segment '{}' is declared more than once", member.key),
                });
            }
            members.push(member);
        }

        Ok(MappingDescriptor {
            type_name: self.type_name,
            prefix: self.prefix,
            naming_strategy: self.naming_strategy,
            members,
        })
    }
}

/// Joins a prefix and a key segment with a dot. An empty prefix adds nothing.
pub fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}
