//! Observability for the client
//!
//! Structured one-line JSON logs on stderr, one per typed event.
//!
//! # Principles
//!
//! 1. Logging is read-only: a failed log write never fails a call
//! 2. No background threads
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use td_client::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RequestComplete, &[("path", "/v3/database/list")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a client event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a client event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
