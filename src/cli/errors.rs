//! CLI error types
//!
//! Each category has its own process exit status so scripts can tell a bad
//! setup from a failed API call:
//!
//! | code | exit |
//! |------|------|
//! | `TDC_CONFIG_ERROR` | 2 |
//! | `TDC_IO_ERROR` | 3 |
//! | `TDC_REQUEST_FAILED` | 4 |

use std::fmt;
use std::io;

use crate::api::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file, environment or flags are unusable
    ConfigError,
    /// I/O error (stdout, import file)
    IoError,
    /// API call failed
    RequestFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "TDC_CONFIG_ERROR",
            Self::IoError => "TDC_IO_ERROR",
            Self::RequestFailed => "TDC_REQUEST_FAILED",
        }
    }

    pub fn exit_status(&self) -> i32 {
        match self {
            Self::ConfigError => 2,
            Self::IoError => 3,
            Self::RequestFailed => 4,
        }
    }
}

/// A failed command, printed as `CODE: message`
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RequestFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_status(&self) -> i32 {
        self.code.exit_status()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(format!("Failed to write output: {}", e))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("Failed to encode output: {}", e))
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Config(msg) => Self::config_error(msg),
            ClientError::Io(err) => Self::io_error(err.to_string()),
            ClientError::InvalidInput(msg) => Self::io_error(msg),
            other => Self::request_failed(format!("[{}] {}", other.code(), other)),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
