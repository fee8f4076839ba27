//! Schema descriptor definitions
//!
//! A descriptor is an immutable tree describing the JSON shape an endpoint is
//! expected to return. Supported nodes:
//! - string, integer, float, timestamp, boolean scalars
//! - optional: field may be missing or null, a default is substituted
//! - embedded: value is a JSON document carried inside a string
//! - mapping: object with named, fixed fields
//! - sequence: homogeneous array

use super::value::Value;

/// Scalar kinds a leaf node can demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Timestamp,
    Boolean,
}

impl ScalarKind {
    /// Returns the kind name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Boolean => "boolean",
        }
    }
}

/// Schema descriptor node
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Leaf value of a scalar kind
    Scalar(ScalarKind),
    /// Field may be absent or null; `default` is substituted in that case
    Optional {
        /// Node used when the value is present
        inner: Box<Schema>,
        /// Canonical value substituted on absence
        default: Value,
    },
    /// String value holding a JSON document to be validated against `inner`
    Embedded(Box<Schema>),
    /// Object with fixed fields, checked in declaration order
    Mapping(Vec<FieldDef>),
    /// Homogeneous array
    Sequence(Box<Schema>),
}

/// Named field of a mapping node
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub schema: Schema,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::Scalar(ScalarKind::String)
    }

    pub fn integer() -> Self {
        Schema::Scalar(ScalarKind::Integer)
    }

    pub fn float() -> Self {
        Schema::Scalar(ScalarKind::Float)
    }

    pub fn timestamp() -> Self {
        Schema::Scalar(ScalarKind::Timestamp)
    }

    pub fn boolean() -> Self {
        Schema::Scalar(ScalarKind::Boolean)
    }

    /// Optional node with an explicit default
    pub fn optional(inner: Schema, default: impl Into<Value>) -> Self {
        Schema::Optional {
            inner: Box::new(inner),
            default: default.into(),
        }
    }

    /// Optional node whose default is null
    pub fn nullable(inner: Schema) -> Self {
        Self::optional(inner, Value::Null)
    }

    pub fn embedded(inner: Schema) -> Self {
        Schema::Embedded(Box::new(inner))
    }

    pub fn sequence(element: Schema) -> Self {
        Schema::Sequence(Box::new(element))
    }

    /// Mapping node from `(name, schema)` pairs
    pub fn mapping<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        Schema::Mapping(
            fields
                .into_iter()
                .map(|(name, schema)| FieldDef::new(name, schema))
                .collect(),
        )
    }

    /// Returns the node name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::Scalar(kind) => kind.type_name(),
            Schema::Optional { inner, .. } => inner.type_name(),
            Schema::Embedded(_) => "embedded JSON string",
            Schema::Mapping(_) => "object",
            Schema::Sequence(_) => "array",
        }
    }

    /// Returns true if the node tolerates absence
    pub fn is_optional(&self) -> bool {
        matches!(self, Schema::Optional { .. })
    }

    /// Looks up a field of a mapping node
    pub fn field(&self, name: &str) -> Option<&Schema> {
        match self {
            Schema::Mapping(fields) => fields.iter().find(|f| f.name == name).map(|f| &f.schema),
            _ => None,
        }
    }
}
