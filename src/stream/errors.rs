//! Record stream error types
//!
//! Error codes:
//! - TD_MALFORMED_STREAM: the stream ended mid-record or holds invalid bytes
//! - TD_RECORD_CALLBACK_FAILED: the per-record callback rejected a record

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Boxed error returned by record callbacks
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Stream error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorCode {
    /// Decode failed before a clean end of stream
    MalformedStream,
    /// Application callback returned an error
    CallbackFailed,
}

impl StreamErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StreamErrorCode::MalformedStream => "TD_MALFORMED_STREAM",
            StreamErrorCode::CallbackFailed => "TD_RECORD_CALLBACK_FAILED",
        }
    }
}

impl fmt::Display for StreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Record stream error with position context
#[derive(Debug)]
pub struct StreamError {
    code: StreamErrorCode,
    message: String,
    /// Byte offset where the failing record started
    offset: Option<u64>,
    /// Zero-based index of the failing record
    record_index: Option<u64>,
    source: Option<BoxError>,
}

impl StreamError {
    /// Create a malformed stream error at a byte offset
    pub fn malformed(offset: u64, record_index: u64, message: impl Into<String>) -> Self {
        Self {
            code: StreamErrorCode::MalformedStream,
            message: message.into(),
            offset: Some(offset),
            record_index: Some(record_index),
            source: None,
        }
    }

    /// Create a malformed stream error from a failed read
    pub fn read_failed(offset: u64, record_index: u64, source: io::Error) -> Self {
        let message = if source.kind() == io::ErrorKind::UnexpectedEof {
            "Stream ended in the middle of a record".to_string()
        } else {
            format!("Failed to read stream: {}", source)
        };
        Self {
            code: StreamErrorCode::MalformedStream,
            message,
            offset: Some(offset),
            record_index: Some(record_index),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap an error returned by a record callback
    pub fn callback_failed(record_index: u64, source: BoxError) -> Self {
        Self {
            code: StreamErrorCode::CallbackFailed,
            message: format!("Record callback rejected record {}", record_index),
            offset: None,
            record_index: Some(record_index),
            source: Some(source),
        }
    }

    pub fn code(&self) -> StreamErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn record_index(&self) -> Option<u64> {
        self.record_index
    }

    pub fn is_malformed(&self) -> bool {
        self.code == StreamErrorCode::MalformedStream
    }

    pub fn is_callback(&self) -> bool {
        self.code == StreamErrorCode::CallbackFailed
    }

    /// Takes back the callback's original error
    pub fn into_callback_error(self) -> Option<BoxError> {
        match self.code {
            StreamErrorCode::CallbackFailed => self.source,
            StreamErrorCode::MalformedStream => None,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (at byte {})", offset)?;
        }
        if let (StreamErrorCode::CallbackFailed, Some(source)) = (self.code, &self.source) {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for StreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StreamErrorCode::MalformedStream.code(), "TD_MALFORMED_STREAM");
        assert_eq!(StreamErrorCode::CallbackFailed.code(), "TD_RECORD_CALLBACK_FAILED");
    }

    #[test]
    fn test_truncation_message() {
        let err = StreamError::read_failed(
            17,
            2,
            io::Error::new(io::ErrorKind::UnexpectedEof, "eof"),
        );
        assert!(err.is_malformed());
        assert_eq!(err.offset(), Some(17));
        assert_eq!(err.record_index(), Some(2));
        assert!(err.to_string().contains("middle of a record"));
        assert!(err.to_string().contains("byte 17"));
    }

    #[test]
    fn test_callback_error_round_trip() {
        let err = StreamError::callback_failed(4, "quota exceeded".into());
        assert!(err.is_callback());
        assert!(err.source().is_some());
        assert!(err.to_string().contains("quota exceeded"));

        let original = err.into_callback_error().unwrap();
        assert_eq!(original.to_string(), "quota exceeded");
    }

    #[test]
    fn test_malformed_has_no_callback_error() {
        let err = StreamError::malformed(0, 0, "reserved marker 0xc1");
        assert!(err.into_callback_error().is_none());
    }
}
