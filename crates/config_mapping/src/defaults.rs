//! Default values for unset members.
//!
//! A member may declare one of three defaults:
//!
//! * a literal, converted exactly like a configured value
//! * a computed default, a function over the members resolved before it
//! * an expression such as `https://${host}`, expanded from earlier members
//!   and then converted like a literal
//!
//! Computed defaults and expressions only see members declared before the
//! member they belong to. Referring to the member itself or to a later one is
//! reported as [`CoercionError::ForwardReferenceUnsupported`]. A computed
//! default must return a value of the member's declared type; anything else
//! is reported as [`CoercionError::DefaultTypeMismatch`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::coercion::coerce;
use crate::collections::{join_list, parse_sequence};
use crate::descriptor::{MappingDescriptor, MemberDescriptor, MemberKind};
use crate::errors::{CoercionError, ConfigurationError, ConfigurationResult};
use crate::value::{FromValue, Value};

#[cfg(test)]
#[path = "defaults_tests.rs"]
mod tests;

type DefaultFn = dyn Fn(&PartialMapping<'_>) -> Result<Value, CoercionError> + Send + Sync;

/// A default computed from earlier members of the same mapping.
///
/// # Examples
///
/// ```rust
/// use config_mapping::{ComputedDefault, Value};
///
/// let server_url = ComputedDefault::new(|mapping| {
///     let host: String = mapping.value("host")?;
///     Ok(Value::String(format!("https://{}", host)))
/// });
/// ```
#[derive(Clone)]
pub struct ComputedDefault {
    compute: Arc<DefaultFn>,
}

impl ComputedDefault {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn(&PartialMapping<'_>) -> Result<Value, CoercionError> + Send + Sync + 'static,
    {
        Self {
            compute: Arc::new(compute),
        }
    }

    fn evaluate(&self, mapping: &PartialMapping<'_>) -> Result<Value, CoercionError> {
        (self.compute)(mapping)
    }
}

impl fmt::Debug for ComputedDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputedDefault(..)")
    }
}

/// Default declared for a member.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Literal(String),
    Computed(ComputedDefault),
    Expression(Expression),
}

impl DefaultValue {
    pub fn literal(value: impl Into<String>) -> Self {
        DefaultValue::Literal(value.into())
    }

    pub fn computed<F>(compute: F) -> Self
    where
        F: Fn(&PartialMapping<'_>) -> Result<Value, CoercionError> + Send + Sync + 'static,
    {
        DefaultValue::Computed(ComputedDefault::new(compute))
    }

    /// Parses an expression default such as `https://${host}`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidDeclaration` for an unterminated
    /// or empty `${}` reference.
    pub fn expression(template: &str) -> ConfigurationResult<Self> {
        Expression::parse(template).map(DefaultValue::Expression)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Reference {
        member: String,
        fallback: Option<String>,
    },
}

/// A string template referencing sibling members.
///
/// `${name}` is replaced by the raw form of member `name`. `${name:text}`
/// uses `text` when the member is an absent optional. `\$` is a literal
/// dollar sign.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    segments: Vec<Segment>,
}

impl Expression {
    pub fn parse(template: &str) -> ConfigurationResult<Self> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'$') => {
                    text.push('$');
                    chars.next();
                }
                '$' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(invalid_expression(template, "unterminated '${'"));
                    }

                    let (member, fallback) = match body.split_once(':') {
                        Some((member, fallback)) => (member, Some(fallback.to_string())),
                        None => (body.as_str(), None),
                    };
                    if member.trim().is_empty() {
                        return Err(invalid_expression(template, "empty reference"));
                    }

                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Reference {
                        member: member.trim().to_string(),
                        fallback,
                    });
                }
                other => text.push(other),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of the members the expression refers to, in order.
    pub fn references(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Reference { member, .. } => Some(member.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }

    /// Expands the expression against the members resolved so far.
    pub fn expand(&self, mapping: &PartialMapping<'_>) -> Result<String, CoercionError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Reference { member, fallback } => {
                    let value = mapping.get(member)?;
                    match (value, fallback) {
                        (Value::Absent, Some(fallback)) => out.push_str(fallback),
                        (Value::Absent, None) => {}
                        (value, _) => out.push_str(&render(mapping.member(), member, value)?),
                    }
                }
            }
        }
        Ok(out)
    }
}

fn render(owner: &str, referenced: &str, value: &Value) -> Result<String, CoercionError> {
    let raw = match value {
        Value::List(items) => items
            .iter()
            .map(Value::to_raw)
            .collect::<Option<Vec<String>>>()
            .map(|items| join_list(&items)),
        other => other.to_raw(),
    };
    raw.ok_or_else(|| CoercionError::InvalidFormat {
        value: referenced.to_string(),
        expected: "string".to_string(),
        reason: format!(
            "member holds a {} value, which cannot be used in the default of '{}'",
            value.kind(),
            owner
        ),
    })
}

fn invalid_expression(template: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidDeclaration {
        field: "default".to_string(),
        reason: format!("Invalid default expression '{}': {}", template, reason),
    }
}

/// View of a mapping under construction, handed to computed defaults.
///
/// Only members declared before the member being defaulted are visible.
pub struct PartialMapping<'a> {
    descriptor: &'a MappingDescriptor,
    position: usize,
    resolved: &'a [Option<Value>],
}

impl<'a> PartialMapping<'a> {
    /// Creates a view for the member at `position`.
    ///
    /// `resolved` holds one slot per member resolved so far; `None` marks a
    /// member that failed.
    pub fn new(
        descriptor: &'a MappingDescriptor,
        position: usize,
        resolved: &'a [Option<Value>],
    ) -> Self {
        Self {
            descriptor,
            position,
            resolved,
        }
    }

    /// Declared name of the member whose default is being computed.
    pub fn member(&self) -> &str {
        self.descriptor
            .members()
            .get(self.position)
            .map(MemberDescriptor::name)
            .unwrap_or_default()
    }

    /// Returns an earlier member's resolved value.
    ///
    /// # Errors
    ///
    /// * `ForwardReferenceUnsupported` if `name` is this member or a later one
    /// * `UnknownMember` if the mapping has no such member
    /// * `UnresolvedDependency` if the member failed to resolve
    pub fn get(&self, name: &str) -> Result<&'a Value, CoercionError> {
        let index = self
            .descriptor
            .position_of(name)
            .ok_or_else(|| CoercionError::UnknownMember {
                member: self.member().to_string(),
                referenced: name.to_string(),
            })?;

        if index >= self.position {
            return Err(CoercionError::ForwardReferenceUnsupported {
                member: self.member().to_string(),
                referenced: name.to_string(),
            });
        }

        self.resolved
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| CoercionError::UnresolvedDependency {
                member: self.member().to_string(),
                referenced: name.to_string(),
            })
    }

    /// Returns an earlier member's value converted to `T`.
    pub fn value<T: FromValue>(&self, name: &str) -> Result<T, CoercionError> {
        let value = self.get(name)?;
        T::from_value(value).ok_or_else(|| CoercionError::InvalidFormat {
            value: name.to_string(),
            expected: T::type_label(),
            reason: format!("member holds a {} value", value.kind()),
        })
    }
}

/// Resolves defaults during one mapping construction.
///
/// Each member's default is evaluated at most once; later requests are
/// answered from the memo.
#[derive(Debug, Default)]
pub struct DefaultResolver {
    memo: HashMap<usize, Result<Value, CoercionError>>,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the default of the member at `mapping`'s position.
    ///
    /// Returns `None` when the member declares no default.
    pub fn resolve(
        &mut self,
        member: &MemberDescriptor,
        mapping: &PartialMapping<'_>,
    ) -> Option<Result<Value, CoercionError>> {
        let default = member.default_value()?;
        if let Some(memoized) = self.memo.get(&mapping.position) {
            return Some(memoized.clone());
        }

        debug!(member = member.name(), "Resolving default value");
        let result = match default {
            DefaultValue::Literal(literal) => convert_literal(member, literal),
            DefaultValue::Computed(computed) => computed
                .evaluate(mapping)
                .and_then(|value| check_computed(member, value)),
            DefaultValue::Expression(expression) => expression
                .expand(mapping)
                .and_then(|expanded| convert_literal(member, &expanded)),
        };
        self.memo.insert(mapping.position, result.clone());
        Some(result)
    }
}

fn check_computed(member: &MemberDescriptor, value: Value) -> Result<Value, CoercionError> {
    if member.kind().admits(&value) {
        Ok(value)
    } else {
        Err(CoercionError::DefaultTypeMismatch {
            member: member.name().to_string(),
            expected: member.kind().type_name(),
            actual: value.kind().to_string(),
        })
    }
}

fn convert_literal(member: &MemberDescriptor, literal: &str) -> Result<Value, CoercionError> {
    match member.kind() {
        MemberKind::Single(value_type) | MemberKind::Optional(value_type) => {
            coerce(literal, value_type)
        }
        MemberKind::Sequence(element) | MemberKind::OptionalSequence(element) => {
            parse_sequence(literal, element).map(Value::List)
        }
        kind => Err(CoercionError::InvalidFormat {
            value: literal.to_string(),
            expected: kind.type_name(),
            reason: "groups and maps cannot be created from a default".to_string(),
        }),
    }
}
