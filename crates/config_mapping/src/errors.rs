//! Configuration mapping error types.
//!
//! Errors are split in two layers. `CoercionError` describes why a single
//! value could not be produced. `MappingError` aggregates every failing
//! member of one `build` call so that a single report lists all problems.
//! `ConfigurationError` is the crate level error used by the public API.

use std::fmt;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Failure to produce a single typed value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("cannot convert '{value}' to {expected}: {reason}")]
    InvalidFormat {
        value: String,
        expected: String,
        reason: String,
    },

    #[error("failed to construct {expected} from '{value}': {cause}")]
    ConstructionFailed {
        value: String,
        expected: String,
        cause: String,
    },

    #[error("default of '{member}' references '{referenced}', which is declared after it")]
    ForwardReferenceUnsupported { member: String, referenced: String },

    #[error("default of '{member}' references unknown member '{referenced}'")]
    UnknownMember { member: String, referenced: String },

    #[error("default of '{member}' references '{referenced}', which failed to resolve")]
    UnresolvedDependency { member: String, referenced: String },

    #[error("computed default of '{member}' returned a {actual} value, expected {expected}")]
    DefaultTypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },
}

/// Reason a member could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureCause {
    #[error("no value configured and no default declared")]
    MissingProperty,

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// One failing member of a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFailure {
    /// Declared name of the member.
    pub member: String,
    /// Full dotted key that was looked up.
    pub key: String,
    /// Human readable name of the expected type.
    pub expected: String,
    /// What went wrong.
    pub cause: FailureCause,
}

impl MemberFailure {
    /// Returns `true` if the member had no value and no default.
    pub fn is_missing(&self) -> bool {
        matches!(self.cause, FailureCause::MissingProperty)
    }
}

impl fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.key, self.expected, self.cause)
    }
}

/// Aggregate failure of a `build` call.
///
/// Every member that failed to resolve is listed, in declaration order.
/// A mapping either resolves completely or produces this error, never both.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct MappingError {
    pub type_name: String,
    pub prefix: String,
    pub failures: Vec<MemberFailure>,
}

impl MappingError {
    /// Looks up the failure recorded for a member, by declared name or key.
    pub fn failure_for(&self, member: &str) -> Option<&MemberFailure> {
        self.failures
            .iter()
            .find(|f| f.member == member || f.key == member)
    }

    /// Keys of every member that was missing altogether.
    pub fn missing_keys(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter(|f| f.is_missing())
            .map(|f| f.key.as_str())
            .collect()
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.prefix.is_empty() {
            "<root>"
        } else {
            self.prefix.as_str()
        };
        write!(
            f,
            "Failed to map configuration '{}' with prefix '{}': {} member(s) could not be resolved",
            self.type_name,
            prefix,
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

/// Configuration mapping errors.
///
/// Returned by the public API when building mappings, reading typed values
/// out of a resolved mapping, or turning declarations into descriptors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error(transparent)]
    BuildFailed(#[from] MappingError),

    #[error("Invalid mapping declaration: {field} - {reason}")]
    InvalidDeclaration { field: String, reason: String },

    #[error("Failed to parse configuration: {reason}")]
    ParseError { reason: String },

    #[error("Member '{member}' holds a {actual} value, expected {expected}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    #[error("Mapping has no member named '{member}'")]
    UnknownMember { member: String },

    #[error("No mapping registered for type '{type_name}' with prefix '{prefix}'")]
    UnregisteredMapping { type_name: String, prefix: String },
}

/// Result type alias for configuration mapping operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
