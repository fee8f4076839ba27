//! Schema error types
//!
//! Error codes:
//! - TD_SCHEMA_MISMATCH: value shape or type disagrees with the descriptor
//! - TD_MALFORMED_EMBEDDED_DOCUMENT: a string field did not parse as JSON
//! - TD_MALFORMED_RESPONSE: the response body itself did not parse as JSON

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Decoded value disagrees with the descriptor
    SchemaMismatch,
    /// Embedded JSON string failed to parse
    MalformedEmbeddedDocument,
    /// Top-level body failed to parse
    MalformedResponse,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaMismatch => "TD_SCHEMA_MISMATCH",
            SchemaErrorCode::MalformedEmbeddedDocument => "TD_MALFORMED_EMBEDDED_DOCUMENT",
            SchemaErrorCode::MalformedResponse => "TD_MALFORMED_RESPONSE",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "tables[0].id")
    pub field: String,
    /// Expected kind or condition
    pub expected: String,
    /// Actual kind found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "field to be present".into(),
            actual: "missing".into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(field, expected, actual)
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    details: Option<ValidationDetails>,
    source: Option<serde_json::Error>,
}

impl SchemaError {
    /// Create a schema mismatch error
    pub fn mismatch(details: ValidationDetails) -> Self {
        Self {
            code: SchemaErrorCode::SchemaMismatch,
            message: format!("Response does not match schema: {}", details),
            details: Some(details),
            source: None,
        }
    }

    /// Create a missing-field schema mismatch
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::mismatch(ValidationDetails::missing_field(field))
    }

    /// Create a type schema mismatch
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::mismatch(ValidationDetails::type_mismatch(field, expected, actual))
    }

    /// Create a malformed embedded document error
    pub fn malformed_embedded(field: impl Into<String>, source: serde_json::Error) -> Self {
        let field = field.into();
        Self {
            code: SchemaErrorCode::MalformedEmbeddedDocument,
            message: format!("Embedded document at '{}' is not valid JSON", field),
            details: Some(ValidationDetails::new(
                field,
                "JSON document",
                source.to_string(),
            )),
            source: Some(source),
        }
    }

    /// Create a malformed response error
    pub fn malformed_response(source: serde_json::Error) -> Self {
        Self {
            code: SchemaErrorCode::MalformedResponse,
            message: format!("Response body is not valid JSON: {}", source),
            details: None,
            source: Some(source),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    /// Returns the failing field path, if the error is tied to one
    pub fn path(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.field.as_str())
    }

    /// Returns true for a schema mismatch
    pub fn is_mismatch(&self) -> bool {
        self.code == SchemaErrorCode::SchemaMismatch
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
