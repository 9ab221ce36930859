//! Typed primitive values shared by filters, sort keys and cursors.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whitelisted field kind → decides how raw query-string text is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Bool,
    Int,
    Real,
    Text,
    Timestamp,
    Uuid,
}

impl FieldKind {
    /// Parse one raw (already URL-decoded) value.
    pub fn parse(self, raw: &str) -> Result<Value, String> {
        match self {
            FieldKind::Bool => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| format!("'{raw}' is not a valid boolean")),
            FieldKind::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{raw}' is not a valid integer")),
            FieldKind::Real => match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Real(f)),
                _ => Err(format!("'{raw}' is not a valid number")),
            },
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|_| format!("'{raw}' is not a valid RFC 3339 timestamp")),
            FieldKind::Uuid => raw
                .parse::<Uuid>()
                .map(Value::Uuid)
                .map_err(|_| format!("'{raw}' is not a valid uuid")),
        }
    }

    /// Whether `value` may stand in a slot of this kind. Null fits everywhere.
    pub fn accepts(self, value: &Value) -> bool {
        match value.kind() {
            None => true,
            Some(kind) => kind == self,
        }
    }
}

// Spellings accepted by common schema libraries.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// A single typed value.
///
/// Values carry a total order: `Null` sorts first, values of the same kind
/// compare naturally (reals via `f64::total_cmp`), and values of different
/// kinds compare by kind rank. Collections sort with this order and keyset
/// bounds are evaluated with it, so both always agree.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(#[serde(with = "real_repr")] f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

/// Finite reals travel as JSON numbers; NaN and the infinities, which JSON
/// cannot carry, as the strings `"NaN"`, `"inf"` and `"-inf"`.
mod real_repr {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Special(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(f) => Ok(f),
            Repr::Special(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("'{other}' is not a real number"))),
            },
        }
    }
}

impl Value {
    pub fn kind(&self) -> Option<FieldKind> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => FieldKind::Bool,
            Value::Int(_) => FieldKind::Int,
            Value::Real(_) => FieldKind::Real,
            Value::Text(_) => FieldKind::Text,
            Value::Timestamp(_) => FieldKind::Timestamp,
            Value::Uuid(_) => FieldKind::Uuid,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Real(_) => 3,
            Value::Text(_) => 4,
            Value::Timestamp(_) => 5,
            Value::Uuid(_) => 6,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Timestamp(dt) => f.write_str(&dt.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{u}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::Timestamp(dt)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
