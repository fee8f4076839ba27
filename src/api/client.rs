//! HTTP client for the `/v3` API
//!
//! One method per endpoint. Each call reads the whole response body, then
//! hands it to the schema validator (JSON endpoints) or the record decoder
//! (table tail and job results).

use std::io::Cursor;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value as JsonValue;

use crate::config::ClientConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{
    format_api_timestamp, validate_json, FieldReader, FromCanonical, Schema, SchemaResult, Value,
};
use crate::stream::{BoxError, Record, RecordDecoder};

use super::errors::{ClientError, ClientResult};
use super::schemas;
use super::types::{
    AccountInfo, Column, DatabaseInfo, ImportBlob, JobStatus, Query, ResultInfo, ServerStatus,
    TableInfo, TailOptions,
};

/// Leading bytes of every gzip member
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decoder over a fully read response body
pub type RecordStream = RecordDecoder<Cursor<Vec<u8>>>;

/// Client for the analytics platform API
pub struct TdClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl TdClient {
    /// Create a client from a validated configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ClientError::Config("Invalid user_agent".to_string()))?,
        );
        if let Some(ref api_key) = config.api_key {
            let mut value = HeaderValue::from_str(&format!("TD1 {}", api_key))
                .map_err(|_| ClientError::Config("Invalid API key format".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, config })
    }

    /// Create a client from `TD_CLIENT_API_KEY` and `TD_API_SERVER`
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =========================================================================
    // Account & system
    // =========================================================================

    pub async fn server_status(&self) -> ClientResult<ServerStatus> {
        let path = "/v3/system/server_status";
        let body = self.execute(self.http.get(self.url(path)), "GET", path).await?;
        let canonical = self.validate(path, &body, schemas::server_status())?;
        Ok(ServerStatus::from_canonical(canonical, "")?)
    }

    pub async fn show_account(&self) -> ClientResult<AccountInfo> {
        let path = "/v3/account/show";
        let body = self.execute(self.http.get(self.url(path)), "GET", path).await?;
        let canonical = self.validate(path, &body, schemas::account())?;
        Ok(take_root(canonical, |r| r.take("account"))?)
    }

    // =========================================================================
    // Databases
    // =========================================================================

    pub async fn list_databases(&self) -> ClientResult<Vec<DatabaseInfo>> {
        let path = "/v3/database/list";
        let body = self.execute(self.http.get(self.url(path)), "GET", path).await?;
        let canonical = self.validate(path, &body, schemas::databases())?;
        Ok(take_root(canonical, |r| r.take("databases"))?)
    }

    /// `options` are passed through as form parameters
    pub async fn create_database(&self, db: &str, options: &[(&str, &str)]) -> ClientResult<()> {
        let path = format!("/v3/database/create/{}", escape(db));
        let request = self.http.post(self.url(&path)).form(options);
        self.execute(request, "POST", &path).await?;
        Ok(())
    }

    pub async fn delete_database(&self, db: &str) -> ClientResult<()> {
        let path = format!("/v3/database/delete/{}", escape(db));
        self.execute(self.http.post(self.url(&path)), "POST", &path)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Tables
    // =========================================================================

    pub async fn list_tables(&self, db: &str) -> ClientResult<Vec<TableInfo>> {
        let path = format!("/v3/table/list/{}", escape(db));
        let body = self.execute(self.http.get(self.url(&path)), "GET", &path).await?;
        let canonical = self.validate(&path, &body, schemas::tables())?;
        Ok(take_root(canonical, |r| r.take("tables"))?)
    }

    pub async fn create_log_table(&self, db: &str, table: &str) -> ClientResult<()> {
        self.create_table(db, table, "log", &[]).await
    }

    pub async fn create_item_table(
        &self,
        db: &str,
        table: &str,
        primary_key: &str,
        primary_key_type: &str,
    ) -> ClientResult<()> {
        self.create_table(
            db,
            table,
            "item",
            &[("primary_key", primary_key), ("primary_key_type", primary_key_type)],
        )
        .await
    }

    async fn create_table(
        &self,
        db: &str,
        table: &str,
        table_type: &str,
        params: &[(&str, &str)],
    ) -> ClientResult<()> {
        let path = format!(
            "/v3/table/create/{}/{}/{}",
            escape(db),
            escape(table),
            escape(table_type)
        );
        let request = self.http.post(self.url(&path)).form(params);
        self.execute(request, "POST", &path).await?;
        Ok(())
    }

    pub async fn swap_table(&self, db: &str, table1: &str, table2: &str) -> ClientResult<()> {
        let path = format!(
            "/v3/table/swap/{}/{}/{}",
            escape(db),
            escape(table1),
            escape(table2)
        );
        self.execute(self.http.post(self.url(&path)), "POST", &path)
            .await?;
        Ok(())
    }

    /// Replaces the table's column list
    pub async fn update_schema(&self, db: &str, table: &str, columns: &[Column]) -> ClientResult<()> {
        let path = format!("/v3/table/update-schema/{}/{}", escape(db), escape(table));
        let schema = serde_json::to_string(&Column::to_schema_json(columns))?;
        let request = self
            .http
            .post(self.url(&path))
            .form(&[("schema", schema.as_str())]);
        self.execute(request, "POST", &path).await?;
        Ok(())
    }

    pub async fn update_expire(&self, db: &str, table: &str, expire_days: u32) -> ClientResult<()> {
        let path = format!("/v3/table/update/{}/{}", escape(db), escape(table));
        let days = expire_days.to_string();
        let request = self
            .http
            .post(self.url(&path))
            .form(&[("expire_days", days.as_str())]);
        self.execute(request, "POST", &path).await?;
        Ok(())
    }

    /// Deletes a table and returns its type
    pub async fn delete_table(&self, db: &str, table: &str) -> ClientResult<String> {
        let path = format!("/v3/table/delete/{}/{}", escape(db), escape(table));
        let body = self
            .execute(self.http.post(self.url(&path)), "POST", &path)
            .await?;
        let canonical = self.validate(&path, &body, schemas::delete_table())?;
        Ok(take_root(canonical, |r| r.take("type"))?)
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Fetches the newest rows of a table as a record stream
    pub async fn tail(
        &self,
        db: &str,
        table: &str,
        options: &TailOptions,
    ) -> ClientResult<RecordStream> {
        let path = format!("/v3/table/tail/{}/{}", escape(db), escape(table));

        let mut params = vec![("format", "msgpack".to_string())];
        if let Some(count) = options.count {
            params.push(("count", count.to_string()));
        }
        if let Some(ref to) = options.to {
            params.push(("to", format_api_timestamp(to)));
        }
        if let Some(ref from) = options.from {
            params.push(("from", format_api_timestamp(from)));
        }

        let request = self.http.post(self.url(&path)).form(&params);
        let body = self.execute(request, "POST", &path).await?;
        Ok(RecordDecoder::new(Cursor::new(body)))
    }

    /// Feeds each tailed row to `f`; see `for_each_record`
    pub async fn tail_each<F, E>(
        &self,
        db: &str,
        table: &str,
        options: &TailOptions,
        f: F,
    ) -> ClientResult<u64>
    where
        F: FnMut(Record) -> Result<(), E>,
        E: Into<BoxError>,
    {
        let stream = self.tail(db, table, options).await?;
        drain(stream, "tail", f)
    }

    /// Uploads a bulk import payload and returns the server's elapsed time.
    ///
    /// With `unique_id`, the server drops a repeated upload with the same id.
    ///
    /// The payload is sent as is. For a `*.gz` format such as `msgpack.gz`
    /// the caller compresses it first (`encode_json_rows` output, gzipped);
    /// an uncompressed payload for a gzip format fails with
    /// `TD_INVALID_INPUT` before any request is made.
    pub async fn import(
        &self,
        db: &str,
        table: &str,
        format: &str,
        blob: ImportBlob,
        unique_id: Option<&str>,
    ) -> ClientResult<f64> {
        let path = match unique_id.filter(|id| !id.is_empty()) {
            Some(id) => format!(
                "/v3/table/import_with_id/{}/{}/{}/{}",
                escape(db),
                escape(table),
                escape(id),
                escape(format)
            ),
            None => format!(
                "/v3/table/import/{}/{}/{}",
                escape(db),
                escape(table),
                escape(format)
            ),
        };

        let payload = blob.into_bytes().await?;
        if format.ends_with(".gz") && !payload.starts_with(&GZIP_MAGIC) {
            return Err(ClientError::InvalidInput(format!(
                "format '{}' expects a gzip-compressed payload",
                format
            )));
        }
        let size = payload.len().to_string();
        let request = self
            .http
            .put(self.url(&path))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload);
        let body = self.execute(request, "PUT", &path).await?;
        let canonical = self.validate(&path, &body, schemas::import())?;
        let elapsed: f64 = take_root(canonical, |r| r.take("elapsed_time"))?;

        log_event_with_fields(
            Event::ImportComplete,
            &[("path", &path), ("bytes", &size), ("elapsed_time", &elapsed.to_string())],
        );
        Ok(elapsed)
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    /// Submits a query job and returns its id
    pub async fn submit_query(&self, db: &str, query: &Query) -> ClientResult<String> {
        let path = format!(
            "/v3/job/issue/{}/{}",
            escape(&query.query_type),
            escape(db)
        );

        let mut params = vec![
            ("query", query.query.clone()),
            ("priority", query.priority.to_string()),
            ("retry_limit", query.retry_limit.to_string()),
        ];
        if !query.result_url.is_empty() {
            params.push(("result", query.result_url.clone()));
        }

        let request = self.http.post(self.url(&path)).form(&params);
        let body = self.execute(request, "POST", &path).await?;
        let canonical = self.validate(&path, &body, schemas::job_issue())?;
        Ok(take_root(canonical, |r| r.take("job_id"))?)
    }

    pub async fn job_status(&self, job_id: &str) -> ClientResult<JobStatus> {
        let path = format!("/v3/job/status/{}", escape(job_id));
        let body = self.execute(self.http.get(self.url(&path)), "GET", &path).await?;
        let canonical = self.validate(&path, &body, schemas::job_status())?;
        Ok(JobStatus::from_canonical(canonical, "")?)
    }

    /// Fetches a finished job's result rows as a record stream
    pub async fn job_result(&self, job_id: &str) -> ClientResult<RecordStream> {
        let path = format!("/v3/job/result/{}", escape(job_id));
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("format", "msgpack")]);
        let body = self.execute(request, "GET", &path).await?;
        Ok(RecordDecoder::new(Cursor::new(body)))
    }

    /// Feeds each result row to `f`; see `for_each_record`
    pub async fn job_result_each<F, E>(&self, job_id: &str, f: F) -> ClientResult<u64>
    where
        F: FnMut(Record) -> Result<(), E>,
        E: Into<BoxError>,
    {
        let stream = self.job_result(job_id).await?;
        drain(stream, "job_result", f)
    }

    /// Lists saved result destinations
    pub async fn list_results(&self) -> ClientResult<Vec<ResultInfo>> {
        let path = "/v3/result/list";
        let body = self.execute(self.http.get(self.url(path)), "GET", path).await?;
        let canonical = self.validate(path, &body, schemas::results())?;
        Ok(take_root(canonical, |r| r.take("results"))?)
    }

    // =========================================================================
    // Internal HTTP methods
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Sends a request and returns the body of a 2xx response
    async fn execute(&self, request: RequestBuilder, method: &str, path: &str) -> ClientResult<Vec<u8>> {
        let start = Instant::now();
        log_event_with_fields(Event::RequestBegin, &[("method", method), ("path", path)]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                log_event_with_fields(
                    Event::RequestFailed,
                    &[("method", method), ("path", path), ("error", &e.to_string())],
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        let elapsed_ms = start.elapsed().as_millis().to_string();

        if status.is_success() {
            log_event_with_fields(
                Event::RequestComplete,
                &[
                    ("method", method),
                    ("path", path),
                    ("status", status.as_str()),
                    ("elapsed_ms", &elapsed_ms),
                    ("bytes", &body.len().to_string()),
                ],
            );
            return Ok(body);
        }

        let message = error_message(status, &body);
        log_event_with_fields(
            failure_event(status),
            &[
                ("method", method),
                ("path", path),
                ("status", status.as_str()),
                ("elapsed_ms", &elapsed_ms),
                ("error", &message),
            ],
        );
        Err(ClientError::from_status(status.as_u16(), message))
    }

    fn validate(&self, path: &str, body: &[u8], schema: &Schema) -> ClientResult<Value> {
        validate_json(body, schema).map_err(|e| {
            log_event_with_fields(
                Event::ResponseRejected,
                &[("path", path), ("code", e.code().code()), ("error", e.message())],
            );
            ClientError::from(e)
        })
    }
}

/// Opens the top-level mapping of a validated response
fn take_root<T, F>(canonical: Value, f: F) -> SchemaResult<T>
where
    F: FnOnce(&mut FieldReader) -> SchemaResult<T>,
{
    let mut reader = FieldReader::new(canonical, "")?;
    f(&mut reader)
}

fn drain<F, E>(mut stream: RecordStream, source: &str, f: F) -> ClientResult<u64>
where
    F: FnMut(Record) -> Result<(), E>,
    E: Into<BoxError>,
{
    match stream.for_each_record(f) {
        Ok(count) => {
            log_event_with_fields(
                Event::StreamComplete,
                &[("source", source), ("records", &count.to_string())],
            );
            Ok(count)
        }
        Err(e) => {
            log_event_with_fields(
                Event::StreamAborted,
                &[
                    ("source", source),
                    ("code", e.code().code()),
                    ("records", &stream.records_read().to_string()),
                ],
            );
            Err(e.into())
        }
    }
}

/// 4xx answers are the caller's to handle; 5xx means the service failed
fn failure_event(status: StatusCode) -> Event {
    if status.is_client_error() {
        Event::RequestRejected
    } else {
        Event::RequestFailed
    }
}

/// Prefers the `message` or `error` field of a JSON error body
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(JsonValue::Object(map)) = serde_json::from_slice::<JsonValue>(body) {
        for key in ["message", "error"] {
            if let Some(JsonValue::String(s)) = map.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    } else {
        text.to_string()
    }
}

fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
