//! Canonical values produced by the validator
//!
//! Every value that passes validation is normalized into one of these
//! variants, so callers never see the server's encoding quirks (numeric
//! strings, embedded documents, API-formatted timestamps).

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::errors::{SchemaError, SchemaResult};

/// Canonical value tree
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the variant name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Sequence(_) => "array",
            Value::Mapping(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a field of a mapping value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(name))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

/// Conversion from a validated canonical value into a typed result
pub trait FromCanonical: Sized {
    /// `path` names the value's position for error reporting
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self>;
}

impl FromCanonical for Value {
    fn from_canonical(value: Value, _path: &str) -> SchemaResult<Self> {
        Ok(value)
    }
}

impl FromCanonical for String {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(SchemaError::type_mismatch(path, "string", other.type_name())),
        }
    }
}

impl FromCanonical for i64 {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        value
            .as_i64()
            .ok_or_else(|| SchemaError::type_mismatch(path, "integer", value.type_name()))
    }
}

impl FromCanonical for f64 {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        value
            .as_f64()
            .ok_or_else(|| SchemaError::type_mismatch(path, "float", value.type_name()))
    }
}

impl FromCanonical for bool {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| SchemaError::type_mismatch(path, "boolean", value.type_name()))
    }
}

impl FromCanonical for DateTime<Utc> {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        value
            .as_timestamp()
            .ok_or_else(|| SchemaError::type_mismatch(path, "timestamp", value.type_name()))
    }
}

impl<T: FromCanonical> FromCanonical for Option<T> {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_canonical(other, path).map(Some),
        }
    }
}

/// Null converts to an empty vector
impl<T: FromCanonical> FromCanonical for Vec<T> {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_canonical(item, &format!("{}[{}]", path, i)))
                .collect(),
            other => Err(SchemaError::type_mismatch(path, "array", other.type_name())),
        }
    }
}

/// Field-by-field reader over a canonical mapping
///
/// Used by `FromCanonical` implementations of result structs.
pub struct FieldReader {
    path: String,
    fields: BTreeMap<String, Value>,
}

impl FieldReader {
    /// Opens a mapping value for field extraction
    pub fn new(value: Value, path: &str) -> SchemaResult<Self> {
        match value {
            Value::Mapping(fields) => Ok(Self {
                path: path.to_string(),
                fields,
            }),
            other => Err(SchemaError::type_mismatch(
                display_path(path),
                "object",
                other.type_name(),
            )),
        }
    }

    /// Removes a field and converts it
    pub fn take<T: FromCanonical>(&mut self, name: &str) -> SchemaResult<T> {
        let path = child_path(&self.path, name);
        let value = self
            .fields
            .remove(name)
            .ok_or_else(|| SchemaError::missing_field(path.clone()))?;
        T::from_canonical(value, &path)
    }

    /// Like `take`, but an absent field is `None`
    pub fn take_opt<T: FromCanonical>(&mut self, name: &str) -> SchemaResult<Option<T>> {
        match self.fields.remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_canonical(value, &child_path(&self.path, name)).map(Some),
        }
    }
}

/// Creates a field path from prefix and field name.
pub(crate) fn child_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Root errors are reported as `$root`
pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "$root"
    } else {
        path
    }
}
