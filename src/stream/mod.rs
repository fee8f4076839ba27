//! Record stream subsystem
//!
//! Table tails and job results arrive as a concatenation of MessagePack
//! values, one per record. The decoder pulls them lazily from any reader and
//! stops cleanly at a record boundary.
//!
//! # Guarantees
//!
//! - Records are yielded in stream order and never retained by the decoder
//! - A stream that ends between records is a clean stop
//! - A stream that ends inside a record, or holds invalid bytes, is
//!   `TD_MALFORMED_STREAM` with the byte offset of the failing record
//! - After an error or end of stream the decoder yields nothing more

mod decoder;
mod encoder;
mod errors;
mod record;

pub use decoder::{RecordDecoder, MAX_NESTING_DEPTH};
pub use encoder::{encode_json_rows, RecordEncoder};
pub use errors::{BoxError, StreamError, StreamErrorCode, StreamResult};
pub use record::Record;
