//! Structured JSON logger
//!
//! Each event becomes a single JSON object on stderr:
//! `{"event":...,"severity":...,<fields sorted by key>}`. Stdout is left to
//! command output. Events below the process-wide threshold are dropped
//! before any formatting happens.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::Value as JsonValue;

/// Log severity levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-request detail
    Trace = 0,
    Info = 1,
    Warn = 2,
    /// A call failed or a response was rejected
    Error = 3,
    Fatal = 4,
}

const LEVELS: [Severity; 5] = [
    Severity::Trace,
    Severity::Info,
    Severity::Warn,
    Severity::Error,
    Severity::Fatal,
];

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Parses a level name, ignoring case; `warning` is accepted for `warn`
    pub fn parse(s: &str) -> Option<Severity> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("warning") {
            return Some(Severity::Warn);
        }
        LEVELS
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static THRESHOLD: AtomicU8 = AtomicU8::new(Severity::Warn as u8);

/// Process-wide JSON line logger
pub struct Logger;

impl Logger {
    pub fn set_min_severity(severity: Severity) {
        THRESHOLD.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        let n = THRESHOLD.load(Ordering::Relaxed) as usize;
        LEVELS[n.min(LEVELS.len() - 1)]
    }

    /// Whether an event of this severity would be written
    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Writes one event line to stderr if `severity` passes the threshold.
    ///
    /// Write failures are swallowed; logging never fails the caller.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        let line = render(severity, event, fields);
        let mut stderr = io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Formats one log line, newline included.
///
/// Repeated field keys keep the last value.
fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let sorted: BTreeMap<&str, &str> = fields.iter().copied().collect();

    let mut line = String::with_capacity(64 + fields.len() * 32);
    line.push_str("{\"event\":");
    push_json_str(&mut line, event);
    line.push_str(",\"severity\":");
    push_json_str(&mut line, severity.as_str());
    for (key, value) in sorted {
        line.push(',');
        push_json_str(&mut line, key);
        line.push(':');
        push_json_str(&mut line, value);
    }
    line.push_str("}\n");
    line
}

fn push_json_str(line: &mut String, s: &str) {
    // Display on a JSON string value yields its quoted, escaped form
    line.push_str(&JsonValue::from(s).to_string());
}
