//! Client events
//!
//! Every log line the client writes names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events in the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Configuration failed validation
    ConfigRejected,

    // Requests
    /// HTTP request about to be sent
    RequestBegin,
    /// HTTP request answered with a success status
    RequestComplete,
    /// Server refused the request with a 4xx status
    RequestRejected,
    /// Transport failure or 5xx status
    RequestFailed,
    /// Response body failed schema validation
    ResponseRejected,

    // Record streams
    /// Record stream fully consumed
    StreamComplete,
    /// Record stream stopped by a decode or callback error
    StreamAborted,

    // Import
    /// Bulk import accepted by the server
    ImportComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigRejected => "CONFIG_REJECTED",
            Event::RequestBegin => "REQUEST_BEGIN",
            Event::RequestComplete => "REQUEST_COMPLETE",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::RequestFailed => "REQUEST_FAILED",
            Event::ResponseRejected => "RESPONSE_REJECTED",
            Event::StreamComplete => "STREAM_COMPLETE",
            Event::StreamAborted => "STREAM_ABORTED",
            Event::ImportComplete => "IMPORT_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RequestBegin => Severity::Trace,
            Event::ConfigLoaded
            | Event::RequestComplete
            | Event::StreamComplete
            | Event::ImportComplete => Severity::Info,
            // 404 and 409 are routine answers for lookups and creates
            Event::RequestRejected => Severity::Warn,
            Event::ConfigRejected
            | Event::RequestFailed
            | Event::ResponseRejected
            | Event::StreamAborted => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
