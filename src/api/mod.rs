//! Endpoint callers for the `/v3` API
//!
//! `TdClient` issues one HTTP request per endpoint and returns typed
//! results. JSON bodies are validated against the descriptors in `schemas`
//! before conversion; table tails and job results come back as record
//! streams.
//!
//! # Example
//!
//! ```ignore
//! use td_client::api::{TdClient, Query};
//!
//! let client = TdClient::from_env()?;
//! for db in client.list_databases().await? {
//!     println!("{} ({} tables)", db.name, db.count);
//! }
//! let job_id = client.submit_query("sample_db", &Query::hive("SELECT COUNT(*) FROM www_access")).await?;
//! ```

mod client;
mod errors;
pub mod schemas;
mod types;

pub use client::{RecordStream, TdClient};
pub use errors::{ApiErrorKind, ClientError, ClientResult};
pub use types::{
    AccountInfo, Column, DatabaseInfo, ImportBlob, JobStatus, Query, ResultInfo, ServerStatus,
    TableInfo, TailOptions,
};
