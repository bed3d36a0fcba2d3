//! Declarative mapping definitions.
//!
//! Mappings can be declared in TOML instead of code. A declaration lists the
//! members in resolution order together with their type and default:
//!
//! ```toml
//! type_name = "GraphOption"
//! prefix = "graph"
//!
//! [[member]]
//! name = "getBaseUrl"
//! type = "string"
//! default = "url"
//!
//! [[member]]
//! name = "getClientId"
//! type = "string"
//!
//! [[member]]
//! name = "scopes"
//! type = "string"
//! shape = "sequence"
//! default = "openid,profile"
//!
//! [[member]]
//! name = "tokenUrl"
//! type = "string"
//! default_expr = "${base-url}/token"
//! ```
//!
//! Types are scalar names (`string`, `bool`, `u16`, ...), `group` for a
//! nested mapping, or the name of a composite registered in a [`TypeRegistry`].
//! The `shape` is `single` (the default), `optional`, `sequence`,
//! `optional-sequence` or `map`. Groups accept every shape except `optional`.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;
use tracing::debug;

use crate::defaults::DefaultValue;
use crate::descriptor::{MappingDescriptor, MemberDescriptor, MemberKind};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::property_name::NamingStrategy;
use crate::value::{CompositeType, ScalarType, ValueType};

#[cfg(test)]
#[path = "declaration_tests.rs"]
mod tests;

const GROUP_TYPE: &str = "group";

/// Composite types available to declarations, by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    composites: HashMap<String, CompositeType>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `ip-addr` and `socket-addr` composites.
    pub fn with_builtins() -> Self {
        Self::new()
            .with(CompositeType::from_str::<IpAddr>("ip-addr"))
            .with(CompositeType::from_str::<SocketAddr>("socket-addr"))
    }

    /// Adds a composite type, replacing one with the same name.
    pub fn with(mut self, composite: CompositeType) -> Self {
        self.composites
            .insert(composite.name().to_string(), composite);
        self
    }

    /// Resolves a type name to a scalar or registered composite.
    pub fn resolve(&self, name: &str) -> Option<ValueType> {
        ScalarType::from_name(name)
            .map(ValueType::Scalar)
            .or_else(|| self.composites.get(name).cloned().map(ValueType::Composite))
    }
}

/// How many values a declared member holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberShape {
    #[default]
    Single,
    Sequence,
    Optional,
    OptionalSequence,
    Map,
}

/// A member as written in a declaration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDeclaration {
    pub name: String,

    #[serde(rename = "type", default = "default_member_type")]
    pub value_type: String,

    #[serde(default)]
    pub shape: MemberShape,

    /// Explicit key segment.
    pub key: Option<String>,

    /// Keeps a `get` prefix in the derived key.
    #[serde(default)]
    pub with_parameters: bool,

    pub default: Option<String>,

    pub default_expr: Option<String>,

    /// Members of a `group`.
    #[serde(default, rename = "member")]
    pub members: Vec<MemberDeclaration>,
}

fn default_member_type() -> String {
    ScalarType::String.name().to_string()
}

/// A mapping as written in a declaration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingDeclaration {
    pub type_name: String,

    #[serde(default)]
    pub prefix: String,

    #[serde(default)]
    pub naming_strategy: NamingStrategy,

    #[serde(default, rename = "member")]
    pub members: Vec<MemberDeclaration>,
}

impl MappingDeclaration {
    /// Parses a declaration from TOML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ParseError` for invalid TOML or unknown fields.
    pub fn from_toml_str(content: &str) -> ConfigurationResult<Self> {
        toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
            reason: e.to_string(),
        })
    }

    /// Turns the declaration into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidDeclaration` if:
    /// - A member names an unknown type
    /// - A member declares both `default` and `default_expr`
    /// - A group has no members, declares a default or is `optional`
    /// - The resulting descriptor is invalid (see [`crate::MappingDescriptorBuilder::build`])
    pub fn to_descriptor(&self, types: &TypeRegistry) -> ConfigurationResult<MappingDescriptor> {
        debug!(
            type_name = %self.type_name,
            members = self.members.len(),
            "Converting mapping declaration"
        );
        build_descriptor(
            &self.type_name,
            &self.prefix,
            self.naming_strategy,
            &self.members,
            types,
        )
    }
}

fn build_descriptor(
    type_name: &str,
    prefix: &str,
    strategy: NamingStrategy,
    members: &[MemberDeclaration],
    types: &TypeRegistry,
) -> ConfigurationResult<MappingDescriptor> {
    let mut builder = MappingDescriptor::builder(type_name, prefix).naming_strategy(strategy);
    for member in members {
        builder = builder.member(member_descriptor(type_name, strategy, member, types)?);
    }
    builder.build()
}

fn member_descriptor(
    owner: &str,
    strategy: NamingStrategy,
    declaration: &MemberDeclaration,
    types: &TypeRegistry,
) -> ConfigurationResult<MemberDescriptor> {
    let field = format!("{}.{}", owner, declaration.name);
    let invalid = |reason: String| ConfigurationError::InvalidDeclaration {
        field: field.clone(),
        reason,
    };

    let kind = if declaration.value_type == GROUP_TYPE {
        if declaration.members.is_empty() {
            return Err(invalid("Group members must declare at least one member".to_string()));
        }
        let group = build_descriptor(&field, "", strategy, &declaration.members, types)?.into();
        match declaration.shape {
            MemberShape::Single => MemberKind::Group(group),
            MemberShape::Sequence => MemberKind::GroupSequence(group),
            MemberShape::OptionalSequence => MemberKind::OptionalGroupSequence(group),
            MemberShape::Map => MemberKind::GroupMap(group),
            MemberShape::Optional => {
                return Err(invalid("Group members cannot be optional".to_string()))
            }
        }
    } else {
        if !declaration.members.is_empty() {
            return Err(invalid(format!(
                "Only '{}' members can declare nested members",
                GROUP_TYPE
            )));
        }
        let value_type = types
            .resolve(&declaration.value_type)
            .ok_or_else(|| invalid(format!("Unknown type '{}'", declaration.value_type)))?;
        match declaration.shape {
            MemberShape::Single => MemberKind::Single(value_type),
            MemberShape::Sequence => MemberKind::Sequence(value_type),
            MemberShape::Optional => MemberKind::Optional(value_type),
            MemberShape::OptionalSequence => MemberKind::OptionalSequence(value_type),
            MemberShape::Map => MemberKind::Map(value_type),
        }
    };

    let mut member = MemberDescriptor::new(declaration.name.clone(), kind);
    if let Some(key) = &declaration.key {
        member = member.with_name(key.clone());
    }
    if declaration.with_parameters {
        member = member.with_parameters();
    }

    match (&declaration.default, &declaration.default_expr) {
        (Some(_), Some(_)) => {
            return Err(invalid(
                "Only one of 'default' and 'default_expr' may be declared".to_string(),
            ))
        }
        (Some(literal), None) => member = member.with_default(DefaultValue::literal(literal)),
        (None, Some(expression)) => member = member.with_default(DefaultValue::expression(expression)?),
        (None, None) => {}
    }

    Ok(member)
}
