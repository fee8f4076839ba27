//! Timestamp recognition
//!
//! The API reports times in two textual shapes, sometimes within the same
//! response:
//! - RFC 3339: `2014-01-01T00:00:00Z`, `2014-01-01T09:00:00.250+09:00`
//! - API format: `2014-01-01 00:00:00 UTC` or `2014-01-01 00:00:00 +0000`
//!
//! Integers are read as Unix seconds.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Format used when sending timestamps to the API
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

static RFC3339_PATTERN: OnceLock<Regex> = OnceLock::new();
static API_PATTERN: OnceLock<Regex> = OnceLock::new();

fn rfc3339_pattern() -> &'static Regex {
    RFC3339_PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$")
            .expect("static pattern compiles")
    })
}

fn api_pattern() -> &'static Regex {
    API_PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} (UTC|[+-]\d{4})$")
            .expect("static pattern compiles")
    })
}

/// Parses a string in one of the recognized shapes
///
/// Returns `None` when the string matches no shape or names an impossible date.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if rfc3339_pattern().is_match(s) {
        return DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc));
    }

    if api_pattern().is_match(s) {
        if s.ends_with("UTC") {
            return NaiveDateTime::parse_from_str(s, API_DATETIME_FORMAT)
                .ok()
                .map(|naive| naive.and_utc());
        }
        return DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z")
            .ok()
            .map(|t| t.with_timezone(&Utc));
    }

    None
}

/// Converts Unix seconds
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Formats a timestamp the way the API expects it in request parameters
pub fn format_api_timestamp(t: &DateTime<Utc>) -> String {
    t.format(API_DATETIME_FORMAT).to_string()
}
