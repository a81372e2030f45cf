//! Opaque data value threaded through a machine run.
//!
//! Callables only ever see a `&Value`. They can replace it by returning a new
//! one, but never mutate it in place, which keeps a compiled machine free of
//! shared mutable data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failure to represent a host value as a [`Value`] (or the reverse).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("value conversion failed: {0}")]
pub struct ConversionError(pub String);

/// Dynamically typed payload of a machine run.
///
/// # Example
///
/// ```rust
/// use statescript::core::Value;
///
/// let v = Value::from("123.456");
/// assert!(v.is_truthy());
/// assert!(!Value::from("").is_truthy());
/// assert!(!Value::from(0).is_truthy());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Boolean interpretation used when a condition callable returns this value.
    ///
    /// Null, `false`, `0`, NaN and empty strings, arrays and maps are falsy.
    /// Everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => !f.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
        }
    }

    /// Normalize any serializable host value.
    pub fn from_serialize<T: Serialize + ?Sized>(input: &T) -> Result<Self, ConversionError> {
        serde_json::to_value(input)
            .map(Self::from)
            .map_err(|e| ConversionError(e.to_string()))
    }

    /// Convert back into a typed host value.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, ConversionError> {
        serde_json::from_value(serde_json::Value::from(self.clone()))
            .map_err(|e| ConversionError(e.to_string()))
    }

    /// Borrow the string payload, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The payload of an `Int`; floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric payload as a float. Integers widen; other variants give `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The payload of a `Bool`. Use [`is_truthy`](Self::is_truthy) for
    /// condition semantics.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the elements of an `Array`.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// True only for `Null`, the value of an input with no content.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::from(i),
            // non-finite floats have no JSON form
            Value::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Map(entries) => Self::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    struct Unrepresentable;

    impl Serialize for Unrepresentable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("opaque handle"))
        }
    }

    #[test]
    fn truthiness_follows_runtime_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(Value::Float(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("foobar").is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::from(vec![1, 2, 3]).is_truthy());
        assert!(!Value::Map(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn from_serialize_normalizes_host_values() {
        #[derive(Serialize)]
        struct Order {
            id: u32,
            items: Vec<&'static str>,
        }

        let v = Value::from_serialize(&Order {
            id: 7,
            items: vec!["a", "b"],
        })
        .unwrap();

        let Value::Map(entries) = v else {
            panic!("expected a map");
        };
        assert_eq!(entries["id"], Value::Int(7));
        assert_eq!(entries["items"], Value::from(vec!["a", "b"]));
    }

    #[test]
    fn from_serialize_reports_unrepresentable_input() {
        let err = Value::from_serialize(&Unrepresentable).unwrap_err();
        assert!(err.to_string().contains("opaque handle"));
    }

    #[test]
    fn deserialize_into_recovers_typed_value() {
        let v = Value::from(vec![1, 2, 3]);
        let typed: Vec<u8> = v.deserialize_into().unwrap();
        assert_eq!(typed, vec![1, 2, 3]);
    }

    #[test]
    fn accessors_match_only_their_variant() {
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::from("2").as_f64(), None);

        assert_eq!(Value::Bool(false).as_bool(), Some(false));
        assert_eq!(Value::Int(1).as_bool(), None);

        let list = Value::from(vec![1, 2]);
        assert_eq!(list.as_array().map(|items| items.len()), Some(2));
        assert_eq!(Value::from("ab").as_array(), None);

        assert!(Value::default().is_null());
        assert!(!Value::Bool(false).is_null());
    }

    #[test]
    fn display_quotes_strings() {
        assert_eq!(Value::from("valid number").to_string(), "\"valid number\"");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::Float(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&Value::from(vec![Value::from("x"), Value::Int(1)])).unwrap();
        assert_eq!(json, r#"["x",1]"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::from(vec![Value::from("x"), Value::Int(1)]));
    }
}
