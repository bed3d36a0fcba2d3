//! Conversion of raw strings into typed values.
//!
//! Scalars are parsed with the type's own `FromStr` implementation after
//! trimming surrounding whitespace. Booleans accept the usual spellings
//! (`true/1/yes/y/on` and `false/0/no/n/off`, any case). Strings are kept
//! exactly as configured. Composite types are handed to their factory.

use std::fmt::Display;
use std::str::FromStr;

use crate::errors::CoercionError;
use crate::value::{ScalarType, Value, ValueType};

#[cfg(test)]
#[path = "coercion_tests.rs"]
mod tests;

const TRUE_VALUES: [&str; 5] = ["true", "1", "yes", "y", "on"];
const FALSE_VALUES: [&str; 5] = ["false", "0", "no", "n", "off"];

/// Converts `raw` into a value of `target`.
///
/// # Errors
///
/// * `CoercionError::InvalidFormat` when a scalar cannot be parsed
/// * `CoercionError::ConstructionFailed` when a composite factory rejects the input
///
/// # Examples
///
/// ```rust
/// use config_mapping::{coerce, ScalarType, Value};
///
/// let port = coerce(" 8080 ", &ScalarType::U16.into())?;
/// assert_eq!(port, Value::Unsigned(8080));
///
/// assert!(coerce("70000", &ScalarType::U16.into()).is_err());
/// # Ok::<(), config_mapping::CoercionError>(())
/// ```
pub fn coerce(raw: &str, target: &ValueType) -> Result<Value, CoercionError> {
    match target {
        ValueType::Scalar(scalar) => coerce_scalar(raw, *scalar),
        ValueType::Composite(composite) => composite.construct(raw),
    }
}

fn coerce_scalar(raw: &str, target: ScalarType) -> Result<Value, CoercionError> {
    let trimmed = raw.trim();
    match target {
        ScalarType::String => Ok(Value::String(raw.to_string())),
        ScalarType::Bool => parse_bool(trimmed).map(Value::Bool),
        ScalarType::Char => {
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid(raw, target, "expected exactly one character")),
            }
        }
        ScalarType::I8 => parse::<i8>(raw, target).map(|v| Value::Integer(v.into())),
        ScalarType::I16 => parse::<i16>(raw, target).map(|v| Value::Integer(v.into())),
        ScalarType::I32 => parse::<i32>(raw, target).map(|v| Value::Integer(v.into())),
        ScalarType::I64 => parse::<i64>(raw, target).map(Value::Integer),
        ScalarType::U8 => parse::<u8>(raw, target).map(|v| Value::Unsigned(v.into())),
        ScalarType::U16 => parse::<u16>(raw, target).map(|v| Value::Unsigned(v.into())),
        ScalarType::U32 => parse::<u32>(raw, target).map(|v| Value::Unsigned(v.into())),
        ScalarType::U64 => parse::<u64>(raw, target).map(Value::Unsigned),
        ScalarType::F32 => parse::<f32>(raw, target).map(|v| Value::Float(v.into())),
        ScalarType::F64 => parse::<f64>(raw, target).map(Value::Float),
    }
}

fn parse<T>(raw: &str, target: ScalarType) -> Result<T, CoercionError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(raw, target, &e.to_string()))
}

fn parse_bool(value: &str) -> Result<bool, CoercionError> {
    if TRUE_VALUES.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if FALSE_VALUES.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Ok(false)
    } else {
        Err(invalid(
            value,
            ScalarType::Bool,
            "expected one of true/false, yes/no, on/off, y/n, 1/0",
        ))
    }
}

fn invalid(raw: &str, target: ScalarType, reason: &str) -> CoercionError {
    CoercionError::InvalidFormat {
        value: raw.to_string(),
        expected: target.name().to_string(),
        reason: reason.to_string(),
    }
}
