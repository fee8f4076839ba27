//! Client error types
//!
//! The core layers keep their coded errors (`SchemaError`, `StreamError`);
//! this enum wraps them together with transport and API status failures.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::schema::SchemaError;
use crate::stream::StreamError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Classification of a non-2xx API response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 404
    NotFound,
    /// 409, e.g. creating a database that exists
    AlreadyExists,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 5xx
    Server,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::AlreadyExists,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorKind::NotFound => "TD_API_NOT_FOUND",
            ApiErrorKind::AlreadyExists => "TD_API_ALREADY_EXISTS",
            ApiErrorKind::Unauthorized => "TD_API_UNAUTHORIZED",
            ApiErrorKind::Forbidden => "TD_API_FORBIDDEN",
            ApiErrorKind::Server => "TD_API_SERVER_ERROR",
            ApiErrorKind::Other => "TD_API_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiErrorKind::NotFound => "Not found",
            ApiErrorKind::AlreadyExists => "Already exists",
            ApiErrorKind::Unauthorized => "Unauthorized",
            ApiErrorKind::Forbidden => "Forbidden",
            ApiErrorKind::Server => "Server error",
            ApiErrorKind::Other => "API error",
        };
        f.write_str(name)
    }
}

/// Errors returned by `TdClient`
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connection, DNS, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("{kind} ({status}): {message}")]
    Api {
        kind: ApiErrorKind,
        status: u16,
        message: String,
    },

    /// Response body failed validation
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Record stream failed to decode or was stopped by a callback
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Request arguments rejected before sending
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Builds the error for a non-2xx status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        ClientError::Api {
            kind: ApiErrorKind::from_status(status),
            status,
            message: message.into(),
        }
    }

    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            ClientError::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::NotFound)
    }

    pub fn is_already_exists(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::AlreadyExists)
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Http(_) => "TD_HTTP_ERROR",
            ClientError::Api { kind, .. } => kind.code(),
            ClientError::Schema(e) => e.code().code(),
            ClientError::Stream(e) => e.code().code(),
            ClientError::Config(_) => "TD_CONFIG_ERROR",
            ClientError::InvalidInput(_) => "TD_INVALID_INPUT",
            ClientError::Io(_) => "TD_IO_ERROR",
            ClientError::Serialization(_) => "TD_SERIALIZATION_ERROR",
        }
    }
}
