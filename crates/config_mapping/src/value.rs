//! Typed configuration values.
//!
//! A [`Value`] is what a member resolves to. Scalars are stored widened
//! (every signed integer as `i64`, every unsigned one as `u64`) while the
//! member's [`ValueType`] keeps the declared width for parsing and range
//! checks. Composite values hold any user type constructed from a single
//! string through a registered [`CompositeType`] factory.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::CoercionError;
use crate::mapping::ResolvedMapping;

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;

/// Object-safe view over a composite configuration value.
///
/// Implemented for every `Debug + Display + PartialEq + Send + Sync` type.
/// `Display` is used to encode the value back to its raw form, so it must
/// produce a string the type's factory accepts.
pub trait CompositeValue: fmt::Debug + fmt::Display + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn eq_value(&self, other: &dyn CompositeValue) -> bool;
}

impl<T> CompositeValue for T
where
    T: fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn CompositeValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarType {
    pub const ALL: [ScalarType; 13] = [
        ScalarType::String,
        ScalarType::Bool,
        ScalarType::Char,
        ScalarType::I8,
        ScalarType::I16,
        ScalarType::I32,
        ScalarType::I64,
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
        ScalarType::F32,
        ScalarType::F64,
    ];

    /// Looks a scalar type up by the name returned from [`ScalarType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scalar| scalar.name() == name)
    }

    /// Name used in error messages and declarations.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Bool => "bool",
            ScalarType::Char => "char",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    /// Whether `value` is a value of this type, as produced by coercion.
    ///
    /// Integers must use the variant coercion produces (`Integer` for signed
    /// types, `Unsigned` for unsigned ones) and fit the declared width.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ScalarType::String, Value::String(_))
            | (ScalarType::Bool, Value::Bool(_))
            | (ScalarType::Char, Value::Char(_))
            | (ScalarType::I64, Value::Integer(_))
            | (ScalarType::U64, Value::Unsigned(_))
            | (ScalarType::F64, Value::Float(_)) => true,
            (ScalarType::I8, Value::Integer(i)) => i8::try_from(*i).is_ok(),
            (ScalarType::I16, Value::Integer(i)) => i16::try_from(*i).is_ok(),
            (ScalarType::I32, Value::Integer(i)) => i32::try_from(*i).is_ok(),
            (ScalarType::U8, Value::Unsigned(u)) => u8::try_from(*u).is_ok(),
            (ScalarType::U16, Value::Unsigned(u)) => u16::try_from(*u).is_ok(),
            (ScalarType::U32, Value::Unsigned(u)) => u32::try_from(*u).is_ok(),
            (ScalarType::F32, Value::Float(f)) => !f.is_finite() || f.abs() <= f64::from(f32::MAX),
            _ => false,
        }
    }
}

type CompositeFactory = dyn Fn(&str) -> Result<Arc<dyn CompositeValue>, String> + Send + Sync;

/// A user type constructed from a single string.
///
/// # Examples
///
/// ```rust
/// use config_mapping::CompositeType;
/// use std::net::SocketAddr;
///
/// // Any `FromStr` type can be registered directly.
/// let addr = CompositeType::from_str::<SocketAddr>("socket-addr");
/// assert!(addr.construct("127.0.0.1:8080").is_ok());
/// assert!(addr.construct("not an address").is_err());
/// ```
#[derive(Clone)]
pub struct CompositeType {
    name: Arc<str>,
    factory: Arc<CompositeFactory>,
}

impl CompositeType {
    /// Registers a composite type with an explicit factory.
    pub fn new<T, E, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: CompositeValue,
        E: fmt::Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            factory: Arc::new(move |raw: &str| {
                factory(raw)
                    .map(|value| Arc::new(value) as Arc<dyn CompositeValue>)
                    .map_err(|e| e.to_string())
            }),
        }
    }

    /// Registers a composite type using its `FromStr` implementation.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str<T>(name: impl Into<String>) -> Self
    where
        T: FromStr + CompositeValue,
        T::Err: fmt::Display,
    {
        Self::new(name, |raw: &str| raw.parse::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the factory. A factory failure becomes `ConstructionFailed`.
    pub fn construct(&self, raw: &str) -> Result<Value, CoercionError> {
        (self.factory)(raw)
            .map(|value| {
                Value::Composite(Composite {
                    type_name: self.name.clone(),
                    value,
                })
            })
            .map_err(|cause| CoercionError::ConstructionFailed {
                value: raw.to_string(),
                expected: self.name.to_string(),
                cause,
            })
    }
}

impl fmt::Debug for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Target type of a single (non-sequence) value.
#[derive(Debug, Clone)]
pub enum ValueType {
    Scalar(ScalarType),
    Composite(CompositeType),
}

impl ValueType {
    pub fn name(&self) -> &str {
        match self {
            ValueType::Scalar(scalar) => scalar.name(),
            ValueType::Composite(composite) => composite.name(),
        }
    }

    /// Whether `value` is a single value of this type.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Scalar(scalar), value) => scalar.admits(value),
            (ValueType::Composite(composite), Value::Composite(held)) => {
                composite.name() == held.type_name()
            }
            (ValueType::Composite(_), _) => false,
        }
    }
}

impl From<ScalarType> for ValueType {
    fn from(scalar: ScalarType) -> Self {
        ValueType::Scalar(scalar)
    }
}

impl From<CompositeType> for ValueType {
    fn from(composite: CompositeType) -> Self {
        ValueType::Composite(composite)
    }
}

/// An instance of a composite type.
#[derive(Debug, Clone)]
pub struct Composite {
    type_name: Arc<str>,
    value: Arc<dyn CompositeValue>,
}

impl Composite {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrows the constructed value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for Composite {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.value.eq_value(other.value.as_ref())
    }
}

/// A resolved member value.
///
/// Equality is structural. Floats compare with `==` except that NaN equals
/// NaN, so two builds from the same properties are always equal.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bool(bool),
    Char(char),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Composite(Composite),
    List(Vec<Value>),
    /// Entries of a map member, by map key.
    Map(BTreeMap<String, Value>),
    Group(ResolvedMapping),
    /// An optional member with no value.
    Absent,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Composite(a), Value::Composite(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Group(a), Value::Group(b)) => a == b,
            (Value::Absent, Value::Absent) => true,
            _ => false,
        }
    }
}

impl Value {
    /// Short name of the stored variant, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Integer(_) => "integer",
            Value::Unsigned(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Composite(_) => "composite",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Group(_) => "group",
            Value::Absent => "absent",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Encodes a single value back to the raw string it was parsed from.
    ///
    /// Returns `None` for lists, maps, groups and absent values, which do not
    /// have a single raw form.
    pub fn to_raw(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Char(c) => Some(c.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Unsigned(u) => Some(u.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Composite(c) => Some(c.value.to_string()),
            Value::List(_) | Value::Map(_) | Value::Group(_) | Value::Absent => None,
        }
    }

    /// Converts the value to JSON for display purposes.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Char(c) => serde_json::Value::String(c.to_string()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Unsigned(u) => serde_json::Value::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Composite(c) => serde_json::Value::String(c.value.to_string()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Group(group) => group.to_json(),
            Value::Absent => serde_json::Value::Null,
        }
    }
}

/// Conversion from a resolved [`Value`] into a Rust type.
pub trait FromValue: Sized {
    /// Name of the Rust type, used in mismatch errors.
    fn type_label() -> String;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    fn type_label() -> String {
        "string".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for bool {
    fn type_label() -> String {
        "bool".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for char {
    fn type_label() -> String {
        "char".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }
}

macro_rules! integer_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn type_label() -> String {
                    stringify!($ty).to_string()
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(*i).ok(),
                        Value::Unsigned(u) => <$ty>::try_from(*u).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_from_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn type_label() -> String {
        "f64".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn type_label() -> String {
        "f32".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f as f32),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn type_label() -> String {
        format!("list of {}", T::type_label())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_list()?
            .iter()
            .map(T::from_value)
            .collect::<Option<Vec<T>>>()
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn type_label() -> String {
        format!("map of {}", T::type_label())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_map()?
            .iter()
            .map(|(key, value)| T::from_value(value).map(|value| (key.clone(), value)))
            .collect()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn type_label() -> String {
        format!("optional {}", T::type_label())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Absent => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for ResolvedMapping {
    fn type_label() -> String {
        "group".to_string()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Group(group) => Some(group.clone()),
            _ => None,
        }
    }
}
