//! Schema validator and normalizer for API responses
//!
//! Validation semantics:
//! - Every declared field must be present unless its node is optional
//! - Undeclared fields are ignored (the server adds fields over time)
//! - Optional fields that are absent or null take their default
//! - Scalars are coerced: integral numbers and numeric strings become
//!   integers, recognized timestamp strings become timestamps
//! - Embedded documents are parsed from their string form and validated
//!   against the inner descriptor
//! - The first failure aborts the walk; there are no partial results

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::errors::{SchemaError, SchemaResult};
use super::timestamp::{from_unix_seconds, parse_timestamp};
use super::types::{FieldDef, ScalarKind, Schema};
use super::value::{child_path, display_path, FromCanonical, Value};

/// Stateless validator; descriptors are borrowed per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates a decoded JSON value against a descriptor.
    ///
    /// # Errors
    ///
    /// - `TD_SCHEMA_MISMATCH` naming the failing path
    /// - `TD_MALFORMED_EMBEDDED_DOCUMENT` if an embedded string is not JSON
    pub fn validate(&self, value: &JsonValue, schema: &Schema) -> SchemaResult<Value> {
        validate_node(Some(value), schema, "")
    }

    /// Parses a raw body and validates it.
    ///
    /// # Errors
    ///
    /// `TD_MALFORMED_RESPONSE` if the body is not JSON, otherwise as `validate`.
    pub fn validate_json(&self, body: &[u8], schema: &Schema) -> SchemaResult<Value> {
        let decoded: JsonValue =
            serde_json::from_slice(body).map_err(SchemaError::malformed_response)?;
        self.validate(&decoded, schema)
    }

    /// Parses, validates and converts a raw body into a typed result.
    pub fn validate_into<T: FromCanonical>(&self, body: &[u8], schema: &Schema) -> SchemaResult<T> {
        let canonical = self.validate_json(body, schema)?;
        T::from_canonical(canonical, "")
    }
}

/// Validates a decoded JSON value against a descriptor.
pub fn validate(value: &JsonValue, schema: &Schema) -> SchemaResult<Value> {
    SchemaValidator.validate(value, schema)
}

/// Parses a raw body and validates it.
pub fn validate_json(body: &[u8], schema: &Schema) -> SchemaResult<Value> {
    SchemaValidator.validate_json(body, schema)
}

/// Parses, validates and converts a raw body into a typed result.
pub fn validate_into<T: FromCanonical>(body: &[u8], schema: &Schema) -> SchemaResult<T> {
    SchemaValidator.validate_into(body, schema)
}

/// Validates a possibly-absent value; `None` means the field was missing.
fn validate_node(value: Option<&JsonValue>, schema: &Schema, path: &str) -> SchemaResult<Value> {
    match schema {
        Schema::Optional { inner, default } => match value {
            None | Some(JsonValue::Null) => Ok(default.clone()),
            Some(present) => validate_present(present, inner, path),
        },
        _ => match value {
            None => Err(SchemaError::missing_field(display_path(path))),
            Some(present) => validate_present(present, schema, path),
        },
    }
}

fn validate_present(value: &JsonValue, schema: &Schema, path: &str) -> SchemaResult<Value> {
    match schema {
        Schema::Scalar(kind) => coerce_scalar(value, *kind, path),
        Schema::Optional { .. } => validate_node(Some(value), schema, path),
        Schema::Embedded(inner) => {
            let text = value
                .as_str()
                .ok_or_else(|| type_error(path, schema.type_name(), value))?;
            let document: JsonValue = serde_json::from_str(text)
                .map_err(|e| SchemaError::malformed_embedded(display_path(path), e))?;
            validate_node(Some(&document), inner, path)
        }
        Schema::Mapping(fields) => {
            let obj = value
                .as_object()
                .ok_or_else(|| type_error(path, "object", value))?;
            validate_mapping(obj, fields, path)
        }
        Schema::Sequence(element) => {
            let arr = value
                .as_array()
                .ok_or_else(|| type_error(path, "array", value))?;
            let mut items = Vec::with_capacity(arr.len());
            for (i, elem) in arr.iter().enumerate() {
                let elem_path = format!("{}[{}]", path, i);
                items.push(validate_node(Some(elem), element, &elem_path)?);
            }
            Ok(Value::Sequence(items))
        }
    }
}

fn validate_mapping(
    obj: &serde_json::Map<String, JsonValue>,
    fields: &[FieldDef],
    path: &str,
) -> SchemaResult<Value> {
    let mut out = BTreeMap::new();
    for field in fields {
        let field_path = child_path(path, &field.name);
        let normalized = validate_node(obj.get(&field.name), &field.schema, &field_path)?;
        out.insert(field.name.clone(), normalized);
    }
    Ok(Value::Mapping(out))
}

fn coerce_scalar(value: &JsonValue, kind: ScalarKind, path: &str) -> SchemaResult<Value> {
    let coerced = match kind {
        ScalarKind::String => value.as_str().map(|s| Value::String(s.to_string())),
        ScalarKind::Integer => coerce_integer(value).map(Value::Integer),
        ScalarKind::Float => coerce_float(value).map(Value::Float),
        ScalarKind::Boolean => coerce_boolean(value).map(Value::Boolean),
        ScalarKind::Timestamp => coerce_timestamp(value).map(Value::Timestamp),
    };
    coerced.ok_or_else(|| type_error(path, kind.type_name(), value))
}

/// Integral numbers and base-10 integer strings; anything outside i64 fails.
fn coerce_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            if n.is_u64() {
                return None;
            }
            let f = n.as_f64()?;
            // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(f as i64)
            } else {
                None
            }
        }
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_boolean(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_timestamp(value: &JsonValue) -> Option<chrono::DateTime<chrono::Utc>> {
    match value {
        JsonValue::String(s) => parse_timestamp(s),
        JsonValue::Number(n) => n.as_i64().and_then(from_unix_seconds),
        _ => None,
    }
}

/// Returns the JSON kind name for error messages.
fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) => {
            if n.is_i64() {
                "integer"
            } else if n.is_u64() {
                "integer out of range"
            } else {
                "float"
            }
        }
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, actual: &JsonValue) -> SchemaError {
    SchemaError::type_mismatch(display_path(path), expected, json_type_name(actual))
}
