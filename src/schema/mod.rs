//! Response schema subsystem
//!
//! Every JSON endpoint response is checked against a declarative descriptor
//! and normalized into canonical values before it reaches the caller.
//!
//! # Design Principles
//!
//! - Descriptors are immutable data, built once and shared
//! - Missing optional fields take defaults, missing required fields fail
//! - Unknown fields are ignored
//! - Numeric strings, API timestamps and embedded JSON are normalized
//! - Errors carry the full field path from the root
//! - All-or-nothing: no partial results

mod errors;
pub mod timestamp;
mod types;
mod validator;
mod value;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use timestamp::{format_api_timestamp, parse_timestamp, API_DATETIME_FORMAT};
pub use types::{FieldDef, ScalarKind, Schema};
pub use validator::{validate, validate_into, validate_json, SchemaValidator};
pub use value::{FieldReader, FromCanonical, Value};
