//! Typed endpoint results and request parameters

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::schema::{FieldReader, FromCanonical, SchemaResult, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStatus {
    pub status: String,
}

impl FromCanonical for ServerStatus {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        let mut r = FieldReader::new(value, path)?;
        Ok(Self {
            status: r.take("status")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub id: i64,
    pub plan: i64,
    pub storage_size: i64,
    pub guaranteed_cores: i64,
    pub maximum_cores: i64,
    pub created_at: DateTime<Utc>,
}

impl FromCanonical for AccountInfo {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        let mut r = FieldReader::new(value, path)?;
        Ok(Self {
            id: r.take("id")?,
            plan: r.take("plan")?,
            storage_size: r.take("storage_size")?,
            guaranteed_cores: r.take("guaranteed_cores")?,
            maximum_cores: r.take("maximum_cores")?,
            created_at: r.take("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub organization: String,
    /// Number of tables
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub permission: String,
}

impl FromCanonical for DatabaseInfo {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        let mut r = FieldReader::new(value, path)?;
        Ok(Self {
            name: r.take("name")?,
            organization: r.take("organization")?,
            count: r.take("count")?,
            created_at: r.take("created_at")?,
            updated_at: r.take("updated_at")?,
            permission: r.take("permission")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub id: i64,
    pub name: String,
    /// `log`, `item`, or `?` when the server omits it
    #[serde(rename = "type")]
    pub table_type: String,
    /// Row count
    pub count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Time of the last import
    pub counter_updated_at: Option<DateTime<Utc>>,
    pub last_log_timestamp: Option<DateTime<Utc>>,
    pub estimated_storage_size: i64,
    /// `[name, type]` pairs
    pub schema: Vec<Vec<String>>,
    pub expire_days: i64,
    pub primary_key: String,
    pub primary_key_type: String,
}

impl FromCanonical for TableInfo {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        let mut r = FieldReader::new(value, path)?;
        Ok(Self {
            id: r.take("id")?,
            name: r.take("name")?,
            table_type: r.take("type")?,
            count: r.take("count")?,
            created_at: r.take("created_at")?,
            updated_at: r.take("updated_at")?,
            counter_updated_at: r.take_opt("counter_updated_at")?,
            last_log_timestamp: r.take_opt("last_log_timestamp")?,
            estimated_storage_size: r.take("estimated_storage_size")?,
            schema: r.take("schema")?,
            expire_days: r.take("expire_days")?,
            primary_key: r.take("primary_key")?,
            primary_key_type: r.take("primary_key_type")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    /// False while the job is queued or running
    pub fn is_finished(&self) -> bool {
        !matches!(self.status.as_str(), "queued" | "running" | "booting")
    }
}

impl FromCanonical for JobStatus {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        let mut r = FieldReader::new(value, path)?;
        Ok(Self {
            job_id: r.take("job_id")?,
            status: r.take("status")?,
            created_at: r.take_opt("created_at")?,
            start_at: r.take_opt("start_at")?,
            end_at: r.take_opt("end_at")?,
        })
    }
}

/// A saved result destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultInfo {
    pub name: String,
    pub url: String,
}

impl FromCanonical for ResultInfo {
    fn from_canonical(value: Value, path: &str) -> SchemaResult<Self> {
        let mut r = FieldReader::new(value, path)?;
        Ok(Self {
            name: r.take("name")?,
            url: r.take("url")?,
        })
    }
}

/// A query to submit as a job
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Engine name used in the job path, e.g. `hive` or `presto`
    pub query_type: String,
    pub query: String,
    /// Result destination URL; empty means none
    pub result_url: String,
    pub priority: i32,
    pub retry_limit: u32,
}

impl Query {
    pub fn new(query_type: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            query_type: query_type.into(),
            query: query.into(),
            result_url: String::new(),
            priority: 0,
            retry_limit: 0,
        }
    }

    pub fn hive(query: impl Into<String>) -> Self {
        Self::new("hive", query)
    }

    pub fn presto(query: impl Into<String>) -> Self {
        Self::new("presto", query)
    }

    pub fn result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = url.into();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }
}

/// Window for `tail`; unset fields are left to the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailOptions {
    pub count: Option<u64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// One column of a table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }

    /// Parses `name:type`
    pub fn parse(text: &str) -> Option<Self> {
        let (name, column_type) = text.split_once(':')?;
        if name.is_empty() || column_type.is_empty() {
            return None;
        }
        Some(Self::new(name, column_type))
    }

    /// Wire form of a column list: `[["name", "type"], ...]`
    pub fn to_schema_json(columns: &[Column]) -> JsonValue {
        JsonValue::Array(
            columns
                .iter()
                .map(|c| json!([c.name, c.column_type]))
                .collect(),
        )
    }
}

/// Payload for a bulk import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportBlob {
    InMemory(Vec<u8>),
    File(PathBuf),
}

impl ImportBlob {
    /// Reads the payload into memory
    pub async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            ImportBlob::InMemory(bytes) => Ok(bytes),
            ImportBlob::File(path) => tokio::fs::read(path).await,
        }
    }
}

impl From<Vec<u8>> for ImportBlob {
    fn from(bytes: Vec<u8>) -> Self {
        ImportBlob::InMemory(bytes)
    }
}

impl From<PathBuf> for ImportBlob {
    fn from(path: PathBuf) -> Self {
        ImportBlob::File(path)
    }
}
