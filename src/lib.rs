//! td-client - client library for the Treasure Data `/v3` API
//!
//! The core is the response layer between raw HTTP bodies and typed results:
//!
//! - `schema`: declarative response descriptors and the validator that
//!   checks and normalizes decoded JSON against them
//! - `stream`: lazy MessagePack record decoding for table tails and job
//!   results, plus the matching encoder for bulk imports
//!
//! `api` holds the endpoint callers built on that core; `config`,
//! `observability` and `cli` carry configuration, structured logging and the
//! `tdc` binary.

pub mod api;
pub mod cli;
pub mod config;
pub mod observability;
pub mod schema;
pub mod stream;

pub use api::{ClientError, ClientResult, TdClient};
pub use config::ClientConfig;
