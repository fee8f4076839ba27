//! Streamed record values
//!
//! A record is one self-describing MessagePack value. It carries no schema;
//! semantic checks happen afterwards by converting to JSON and running the
//! schema validator.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};

/// One decoded MessagePack value
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Nil,
    Boolean(bool),
    /// Signed integers and unsigned integers that fit in i64
    Integer(i64),
    /// Unsigned integers above i64::MAX
    Unsigned(u64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Array(Vec<Record>),
    /// Entries in stream order; keys may be any record
    Map(Vec<(Record, Record)>),
    Extension { type_id: i8, data: Vec<u8> },
}

impl Record {
    pub fn type_name(&self) -> &'static str {
        match self {
            Record::Nil => "nil",
            Record::Boolean(_) => "boolean",
            Record::Integer(_) | Record::Unsigned(_) => "integer",
            Record::Float(_) => "float",
            Record::String(_) => "string",
            Record::Binary(_) => "binary",
            Record::Array(_) => "array",
            Record::Map(_) => "map",
            Record::Extension { .. } => "extension",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Record::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Record::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Record]> {
        match self {
            Record::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a string key in a map record
    pub fn get(&self, key: &str) -> Option<&Record> {
        match self {
            Record::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Converts to a JSON value.
    ///
    /// Binary payloads become base64 strings, extensions become
    /// `{"type": id, "data": base64}`, non-finite floats become null and
    /// non-string map keys are rendered as their JSON text.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Record::Nil => JsonValue::Null,
            Record::Boolean(b) => JsonValue::Bool(*b),
            Record::Integer(n) => JsonValue::from(*n),
            Record::Unsigned(n) => JsonValue::from(*n),
            Record::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Record::String(s) => JsonValue::String(s.clone()),
            Record::Binary(bytes) => JsonValue::String(BASE64.encode(bytes)),
            Record::Array(items) => JsonValue::Array(items.iter().map(Record::to_json).collect()),
            Record::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = match k {
                        Record::String(s) => s.clone(),
                        other => other.to_json().to_string(),
                    };
                    map.insert(key, v.to_json());
                }
                JsonValue::Object(map)
            }
            Record::Extension { type_id, data } => {
                let mut map = Map::with_capacity(2);
                map.insert("type".to_string(), JsonValue::from(*type_id));
                map.insert("data".to_string(), JsonValue::String(BASE64.encode(data)));
                JsonValue::Object(map)
            }
        }
    }

    /// Converts a JSON value into a record.
    ///
    /// Object entries come out sorted by key, the iteration order of
    /// `serde_json::Map` without the `preserve_order` feature.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Record::Nil,
            JsonValue::Bool(b) => Record::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Record::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Record::Unsigned(u)
                } else {
                    Record::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Record::String(s.clone()),
            JsonValue::Array(items) => Record::Array(items.iter().map(Record::from_json).collect()),
            JsonValue::Object(map) => Record::Map(
                map.iter()
                    .map(|(k, v)| (Record::String(k.clone()), Record::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Record {
    fn from(s: &str) -> Self {
        Record::String(s.to_string())
    }
}

impl From<String> for Record {
    fn from(s: String) -> Self {
        Record::String(s)
    }
}

impl From<i64> for Record {
    fn from(n: i64) -> Self {
        Record::Integer(n)
    }
}

impl From<f64> for Record {
    fn from(n: f64) -> Self {
        Record::Float(n)
    }
}

impl From<bool> for Record {
    fn from(b: bool) -> Self {
        Record::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Record {
        Record::Map(vec![
            (Record::from("time"), Record::Integer(1388534400)),
            (Record::from("a"), Record::from("1")),
            (Record::Integer(7), Record::Boolean(true)),
        ])
    }

    #[test]
    fn test_get_by_string_key() {
        let r = row();
        assert_eq!(r.get("time").and_then(Record::as_i64), Some(1388534400));
        assert_eq!(r.get("a").and_then(Record::as_str), Some("1"));
        assert!(r.get("b").is_none());
    }

    #[test]
    fn test_from_json_map_entries_sorted_by_key() {
        let record = Record::from_json(&json!({"time": 1, "host": "a", "code": 200}));
        let keys: Vec<&str> = match record {
            Record::Map(ref entries) => entries.iter().filter_map(|(k, _)| k.as_str()).collect(),
            ref other => panic!("expected map, got {:?}", other),
        };
        assert_eq!(keys, vec!["code", "host", "time"]);
    }

    #[test]
    fn test_to_json() {
        let json = row().to_json();
        assert_eq!(json["time"], json!(1388534400));
        assert_eq!(json["a"], json!("1"));
        assert_eq!(json["7"], json!(true));
    }

    #[test]
    fn test_binary_and_extension_to_json() {
        assert_eq!(Record::Binary(b"hi".to_vec()).to_json(), json!("aGk="));
        assert_eq!(
            Record::Extension { type_id: -1, data: vec![0, 0, 0, 1] }.to_json(),
            json!({"type": -1, "data": "AAAAAQ=="})
        );
        assert_eq!(Record::Float(f64::INFINITY).to_json(), JsonValue::Null);
        assert_eq!(Record::Unsigned(u64::MAX).to_json(), json!(u64::MAX));
    }

    #[test]
    fn test_from_json() {
        let r = Record::from_json(&json!({"a": [1, -2, 2.5, null, "x"]}));
        assert_eq!(
            r.get("a"),
            Some(&Record::Array(vec![
                Record::Integer(1),
                Record::Integer(-2),
                Record::Float(2.5),
                Record::Nil,
                Record::from("x"),
            ]))
        );
    }
}
