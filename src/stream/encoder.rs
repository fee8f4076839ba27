//! MessagePack record stream encoder
//!
//! Writes records in the format `RecordDecoder` reads, always choosing the
//! smallest encoding for integers and lengths. Floats are written as float64
//! so values survive a round trip unchanged.

use std::io::{self, Write};

use serde_json::Value as JsonValue;

use super::record::Record;

/// Sequential record writer
pub struct RecordEncoder<W> {
    writer: W,
    records: u64,
}

impl<W: Write> RecordEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// Appends one record to the stream
    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        encode(&mut self.writer, record)?;
        self.records += 1;
        Ok(())
    }

    /// Appends one JSON value as a record
    pub fn write_json(&mut self, value: &JsonValue) -> io::Result<()> {
        self.write_record(&Record::from_json(value))
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Encodes a batch of JSON rows into an in-memory stream
pub fn encode_json_rows<'a, I>(rows: I) -> io::Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a JsonValue>,
{
    let mut encoder = RecordEncoder::new(Vec::new());
    for row in rows {
        encoder.write_json(row)?;
    }
    Ok(encoder.into_inner())
}

fn encode<W: Write>(w: &mut W, record: &Record) -> io::Result<()> {
    match record {
        Record::Nil => w.write_all(&[0xc0]),
        Record::Boolean(false) => w.write_all(&[0xc2]),
        Record::Boolean(true) => w.write_all(&[0xc3]),
        Record::Integer(n) => write_int(w, *n),
        Record::Unsigned(n) => write_uint(w, *n),
        Record::Float(f) => {
            w.write_all(&[0xcb])?;
            w.write_all(&f.to_be_bytes())
        }
        Record::String(s) => {
            write_str_len(w, s.len())?;
            w.write_all(s.as_bytes())
        }
        Record::Binary(bytes) => {
            write_len(w, bytes.len(), Some(0xc4), 0xc5, 0xc6)?;
            w.write_all(bytes)
        }
        Record::Array(items) => {
            write_container_len(w, items.len(), 0x90, [0xdc, 0xdd])?;
            for item in items {
                encode(w, item)?;
            }
            Ok(())
        }
        Record::Map(entries) => {
            write_container_len(w, entries.len(), 0x80, [0xde, 0xdf])?;
            for (k, v) in entries {
                encode(w, k)?;
                encode(w, v)?;
            }
            Ok(())
        }
        Record::Extension { type_id, data } => {
            let fixed = match data.len() {
                1 => Some(0xd4),
                2 => Some(0xd5),
                4 => Some(0xd6),
                8 => Some(0xd7),
                16 => Some(0xd8),
                _ => None,
            };
            match fixed {
                Some(marker) => w.write_all(&[marker])?,
                None => write_len(w, data.len(), Some(0xc7), 0xc8, 0xc9)?,
            }
            w.write_all(&type_id.to_be_bytes())?;
            w.write_all(data)
        }
    }
}

fn write_int<W: Write>(w: &mut W, n: i64) -> io::Result<()> {
    if n >= 0 {
        return write_uint(w, n as u64);
    }
    if n >= -32 {
        w.write_all(&[n as i8 as u8])
    } else if n >= i8::MIN as i64 {
        w.write_all(&[0xd0, n as i8 as u8])
    } else if n >= i16::MIN as i64 {
        w.write_all(&[0xd1])?;
        w.write_all(&(n as i16).to_be_bytes())
    } else if n >= i32::MIN as i64 {
        w.write_all(&[0xd2])?;
        w.write_all(&(n as i32).to_be_bytes())
    } else {
        w.write_all(&[0xd3])?;
        w.write_all(&n.to_be_bytes())
    }
}

fn write_uint<W: Write>(w: &mut W, n: u64) -> io::Result<()> {
    if n <= 0x7f {
        w.write_all(&[n as u8])
    } else if n <= u8::MAX as u64 {
        w.write_all(&[0xcc, n as u8])
    } else if n <= u16::MAX as u64 {
        w.write_all(&[0xcd])?;
        w.write_all(&(n as u16).to_be_bytes())
    } else if n <= u32::MAX as u64 {
        w.write_all(&[0xce])?;
        w.write_all(&(n as u32).to_be_bytes())
    } else {
        w.write_all(&[0xcf])?;
        w.write_all(&n.to_be_bytes())
    }
}

fn write_str_len<W: Write>(w: &mut W, len: usize) -> io::Result<()> {
    if len < 32 {
        w.write_all(&[0xa0 | len as u8])
    } else {
        write_len(w, len, Some(0xd9), 0xda, 0xdb)
    }
}

fn write_container_len<W: Write>(
    w: &mut W,
    len: usize,
    fix_base: u8,
    markers: [u8; 2],
) -> io::Result<()> {
    if len < 16 {
        w.write_all(&[fix_base | len as u8])
    } else {
        write_len(w, len, None, markers[0], markers[1])
    }
}

/// Writes an 8/16/32-bit length prefix; containers have no 8-bit form
fn write_len<W: Write>(
    w: &mut W,
    len: usize,
    marker8: Option<u8>,
    marker16: u8,
    marker32: u8,
) -> io::Result<()> {
    match marker8 {
        Some(marker) if len <= u8::MAX as usize => return w.write_all(&[marker, len as u8]),
        _ => {}
    }
    if len <= u16::MAX as usize {
        w.write_all(&[marker16])?;
        w.write_all(&(len as u16).to_be_bytes())
    } else if len <= u32::MAX as usize {
        w.write_all(&[marker32])?;
        w.write_all(&(len as u32).to_be_bytes())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("length {} exceeds the 32-bit limit", len),
        ))
    }
}
