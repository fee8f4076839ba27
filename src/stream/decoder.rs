//! MessagePack record stream decoder
//!
//! Record streams (table tail, job results) are a plain concatenation of
//! MessagePack values terminated by end of input. Decoding rules:
//! - End of input at a record boundary is a clean stop
//! - End of input inside a record is `TD_MALFORMED_STREAM`
//! - Invalid markers and excessive nesting are `TD_MALFORMED_STREAM`
//! - After a stop or a failure the decoder yields nothing more
//! - A fresh decoder is required to read a stream again

use std::io::{self, Read};
use std::iter::FusedIterator;

use super::errors::{BoxError, StreamError, StreamResult};
use super::record::Record;

/// Maximum container nesting accepted inside one record.
///
/// Container decoding recurses once per level; this bound keeps a full-depth
/// record well inside a 2 MiB thread stack in debug builds. Same limit as
/// serde_json's recursion limit.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Upper bound on up-front allocation driven by a declared length
const PREALLOC_BYTES: usize = 64 * 1024;
const PREALLOC_ITEMS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Active,
    Finished,
    Failed,
}

/// Failure inside a single record, before position context is attached
enum DecodeFault {
    Io(io::Error),
    Invalid(String),
}

impl From<io::Error> for DecodeFault {
    fn from(e: io::Error) -> Self {
        DecodeFault::Io(e)
    }
}

type DecodeResult<T> = Result<T, DecodeFault>;

/// Forward-only, single-pass record decoder.
///
/// The only state is the read cursor: byte offset and records yielded.
pub struct RecordDecoder<R> {
    reader: R,
    offset: u64,
    records: u64,
    state: DecoderState,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            records: 0,
            state: DecoderState::Active,
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Records yielded so far
    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// True once the stream ended cleanly
    pub fn is_finished(&self) -> bool {
        self.state == DecoderState::Finished
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was decoded
    /// - `Ok(None)` at a clean end of stream (and on every later call)
    /// - `Err(StreamError)` if the stream is truncated or corrupt
    pub fn next_record(&mut self) -> StreamResult<Option<Record>> {
        if self.state != DecoderState::Active {
            return Ok(None);
        }

        let start = self.offset;
        let marker = match self.read_marker_or_eof() {
            Ok(Some(marker)) => marker,
            Ok(None) => {
                self.state = DecoderState::Finished;
                return Ok(None);
            }
            Err(e) => {
                self.state = DecoderState::Failed;
                return Err(StreamError::read_failed(start, self.records, e));
            }
        };

        match self.decode(marker, 0) {
            Ok(record) => {
                self.records += 1;
                Ok(Some(record))
            }
            Err(fault) => {
                self.state = DecoderState::Failed;
                Err(match fault {
                    DecodeFault::Io(e) => StreamError::read_failed(start, self.records, e),
                    DecodeFault::Invalid(msg) => StreamError::malformed(start, self.records, msg),
                })
            }
        }
    }

    /// Feeds every record to `f` until the stream ends.
    ///
    /// Stops at the first callback error and returns it wrapped as
    /// `TD_RECORD_CALLBACK_FAILED`; no further records are read.
    /// Returns the number of records processed.
    pub fn for_each_record<F, E>(&mut self, mut f: F) -> StreamResult<u64>
    where
        F: FnMut(Record) -> Result<(), E>,
        E: Into<BoxError>,
    {
        let mut processed = 0;
        while let Some(record) = self.next_record()? {
            let index = self.records - 1;
            if let Err(e) = f(record) {
                self.state = DecoderState::Failed;
                return Err(StreamError::callback_failed(index, e.into()));
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Reads one byte, distinguishing end of input from failure
    fn read_marker_or_eof(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn decode(&mut self, marker: u8, depth: usize) -> DecodeResult<Record> {
        let record = match marker {
            0x00..=0x7f => Record::Integer(marker as i64),
            0x80..=0x8f => self.decode_map((marker & 0x0f) as usize, depth)?,
            0x90..=0x9f => self.decode_array((marker & 0x0f) as usize, depth)?,
            0xa0..=0xbf => self.decode_str((marker & 0x1f) as usize)?,
            0xc0 => Record::Nil,
            0xc1 => return Err(DecodeFault::Invalid("reserved marker 0xc1".to_string())),
            0xc2 => Record::Boolean(false),
            0xc3 => Record::Boolean(true),
            0xc4 => {
                let len = self.read_u8()? as usize;
                Record::Binary(self.read_bytes(len)?)
            }
            0xc5 => {
                let len = self.read_u16()? as usize;
                Record::Binary(self.read_bytes(len)?)
            }
            0xc6 => {
                let len = self.read_u32()? as usize;
                Record::Binary(self.read_bytes(len)?)
            }
            0xc7 => {
                let len = self.read_u8()? as usize;
                self.decode_ext(len)?
            }
            0xc8 => {
                let len = self.read_u16()? as usize;
                self.decode_ext(len)?
            }
            0xc9 => {
                let len = self.read_u32()? as usize;
                self.decode_ext(len)?
            }
            0xca => Record::Float(f32::from_be_bytes(self.read_array::<4>()?) as f64),
            0xcb => Record::Float(f64::from_be_bytes(self.read_array::<8>()?)),
            0xcc => Record::Integer(self.read_u8()? as i64),
            0xcd => Record::Integer(self.read_u16()? as i64),
            0xce => Record::Integer(self.read_u32()? as i64),
            0xcf => unsigned(u64::from_be_bytes(self.read_array::<8>()?)),
            0xd0 => Record::Integer(i8::from_be_bytes(self.read_array::<1>()?) as i64),
            0xd1 => Record::Integer(i16::from_be_bytes(self.read_array::<2>()?) as i64),
            0xd2 => Record::Integer(i32::from_be_bytes(self.read_array::<4>()?) as i64),
            0xd3 => Record::Integer(i64::from_be_bytes(self.read_array::<8>()?)),
            0xd4 => self.decode_ext(1)?,
            0xd5 => self.decode_ext(2)?,
            0xd6 => self.decode_ext(4)?,
            0xd7 => self.decode_ext(8)?,
            0xd8 => self.decode_ext(16)?,
            0xd9 => {
                let len = self.read_u8()? as usize;
                self.decode_str(len)?
            }
            0xda => {
                let len = self.read_u16()? as usize;
                self.decode_str(len)?
            }
            0xdb => {
                let len = self.read_u32()? as usize;
                self.decode_str(len)?
            }
            0xdc => {
                let len = self.read_u16()? as usize;
                self.decode_array(len, depth)?
            }
            0xdd => {
                let len = self.read_u32()? as usize;
                self.decode_array(len, depth)?
            }
            0xde => {
                let len = self.read_u16()? as usize;
                self.decode_map(len, depth)?
            }
            0xdf => {
                let len = self.read_u32()? as usize;
                self.decode_map(len, depth)?
            }
            0xe0..=0xff => Record::Integer(marker as i8 as i64),
        };
        Ok(record)
    }

    fn decode_array(&mut self, len: usize, depth: usize) -> DecodeResult<Record> {
        check_depth(depth)?;
        let mut items = Vec::with_capacity(len.min(PREALLOC_ITEMS));
        for _ in 0..len {
            let marker = self.read_u8()?;
            items.push(self.decode(marker, depth + 1)?);
        }
        Ok(Record::Array(items))
    }

    fn decode_map(&mut self, len: usize, depth: usize) -> DecodeResult<Record> {
        check_depth(depth)?;
        let mut entries = Vec::with_capacity(len.min(PREALLOC_ITEMS));
        for _ in 0..len {
            let key_marker = self.read_u8()?;
            let key = self.decode(key_marker, depth + 1)?;
            let value_marker = self.read_u8()?;
            let value = self.decode(value_marker, depth + 1)?;
            entries.push((key, value));
        }
        Ok(Record::Map(entries))
    }

    /// Invalid UTF-8 is kept as binary rather than rejected
    fn decode_str(&mut self, len: usize) -> DecodeResult<Record> {
        let bytes = self.read_bytes(len)?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => Record::String(s),
            Err(e) => Record::Binary(e.into_bytes()),
        })
    }

    fn decode_ext(&mut self, len: usize) -> DecodeResult<Record> {
        let type_id = self.read_u8()? as i8;
        let data = self.read_bytes(len)?;
        Ok(Record::Extension { type_id, data })
    }

    fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf)?;
        self.offset += N as u64;
        Ok(buf)
    }

    fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    fn read_bytes(&mut self, len: usize) -> DecodeResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(PREALLOC_BYTES));
        let read = (&mut self.reader).take(len as u64).read_to_end(&mut buf)?;
        self.offset += read as u64;
        if read != len {
            return Err(DecodeFault::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("declared {} bytes, stream held {}", len, read),
            )));
        }
        Ok(buf)
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = StreamResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl<R: Read> FusedIterator for RecordDecoder<R> {}

fn unsigned(n: u64) -> Record {
    i64::try_from(n)
        .map(Record::Integer)
        .unwrap_or(Record::Unsigned(n))
}

fn check_depth(depth: usize) -> DecodeResult<()> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(DecodeFault::Invalid(format!(
            "nesting deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }
    Ok(())
}
