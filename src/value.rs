//! Schema-free scalar values.
//!
//! [`Record`] is what the format-generic readers produce when no Rust type is
//! known: a sorted map from column name to [`Value`]. Values are flat scalars;
//! nested arrays and objects are rejected on read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One scalar cell.
///
/// Serialized untagged, so `{"id":1,"ok":true}` round-trips through JSON and
/// MessagePack as plain values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
}

/// A schema-free row.
pub type Record = BTreeMap<String, Value>;

/// Coerce a text cell to the narrowest matching value.
///
/// Tries, in order: the literals `true`/`false`, a base-10 `i64`, an `f64`,
/// and falls back to the string itself. Only the exact lowercase literals are
/// booleans, so `"1"` is an integer and `"TRUE"` stays a string.
///
/// ```
/// use tabstream::value::{infer_value, Value};
///
/// assert_eq!(infer_value("42"), Value::Int64(42));
/// assert_eq!(infer_value("4.5"), Value::Float64(4.5));
/// assert_eq!(infer_value("true"), Value::Bool(true));
/// assert_eq!(infer_value("n/a"), Value::String("n/a".into()));
/// ```
#[must_use]
pub fn infer_value(s: &str) -> Value {
    match s {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int64(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float64(f);
    }
    Value::String(s.to_string())
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string payload, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Text form used for CSV cells.
///
/// Floats always carry a decimal point or exponent, so `1.0` reads back
/// through [`infer_value`] as a float rather than an integer. CSV has no null,
/// so `Null` is an empty cell and reads back as an empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(x) => write!(f, "{x:?}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
