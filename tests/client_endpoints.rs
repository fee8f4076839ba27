//! Client Endpoint Tests
//!
//! Each endpoint against a mock API server:
//! - Requests carry the TD1 authorization header and the expected form fields
//! - Responses pass through the schema validator before reaching typed results
//! - Non-2xx statuses map to typed API errors
//! - Record endpoints decode msgpack bodies row by row

use chrono::{TimeZone, Utc};
use serde_json::json;
use td_client::api::{ApiErrorKind, Column, ImportBlob, Query, TailOptions};
use td_client::stream::{encode_json_rows, Record};
use td_client::{ClientConfig, ClientError, TdClient};
use wiremock::matchers::{body_bytes, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "1/0123456789abcdef";

// =============================================================================
// Helper Functions
// =============================================================================

fn client_for(server: &MockServer) -> TdClient {
    let config = ClientConfig::builder(server.uri())
        .api_key(API_KEY)
        .build()
        .unwrap();
    TdClient::new(config).unwrap()
}

fn table_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "type": "log",
        "count": 42,
        "created_at": "2014-01-01 00:00:00 UTC",
        "updated_at": "2014-01-02 00:00:00 UTC",
        "counter_updated_at": null,
        "last_log_timestamp": "2014-01-02 12:00:00 UTC",
        "estimated_storage_size": 1024,
        "schema": "[[\"host\",\"string\"],[\"code\",\"long\"]]",
        "expire_days": 30
    })
}

// =============================================================================
// JSON Endpoints
// =============================================================================

#[tokio::test]
async fn test_list_databases_sends_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/database/list"))
        .and(header("authorization", format!("TD1 {}", API_KEY).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "databases": [{
                "name": "sample_db",
                "count": 3,
                "created_at": "2014-01-01 00:00:00 UTC",
                "updated_at": "2014-01-02 00:00:00 UTC",
                "permission": "administrator"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let databases = client_for(&server).list_databases().await.unwrap();
    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].name, "sample_db");
    assert_eq!(databases[0].organization, "");
    assert_eq!(databases[0].count, 3);
    assert_eq!(
        databases[0].created_at,
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_list_tables_decodes_embedded_schema() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/table/list/sample_db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "sample_db",
            "tables": [table_json(1, "www_access"), {
                "id": 2,
                "name": "users",
                "created_at": "2014-01-01 00:00:00 UTC",
                "updated_at": "2014-01-01 00:00:00 UTC",
                "counter_updated_at": null,
                "last_log_timestamp": null,
                "estimated_storage_size": 0,
                "primary_key": "id",
                "primary_key_type": "string"
            }]
        })))
        .mount(&server)
        .await;

    let tables = client_for(&server).list_tables("sample_db").await.unwrap();
    assert_eq!(tables.len(), 2);

    let access = &tables[0];
    assert_eq!(access.table_type, "log");
    assert_eq!(
        access.schema,
        vec![
            vec!["host".to_string(), "string".to_string()],
            vec!["code".to_string(), "long".to_string()],
        ]
    );
    assert!(access.counter_updated_at.is_none());
    assert!(access.last_log_timestamp.is_some());

    let users = &tables[1];
    assert_eq!(users.table_type, "?");
    assert_eq!(users.count, 0);
    assert!(users.schema.is_empty());
    assert_eq!(users.primary_key, "id");
}

#[tokio::test]
async fn test_list_tables_rejects_schema_mismatch() {
    let server = MockServer::start().await;
    let mut bad = table_json(1, "www_access");
    bad["count"] = json!("lots");
    Mock::given(method("GET"))
        .and(path("/v3/table/list/sample_db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "sample_db",
            "tables": [bad]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).list_tables("sample_db").await.unwrap_err();
    assert_eq!(err.code(), "TD_SCHEMA_MISMATCH");
    match err {
        ClientError::Schema(e) => assert_eq!(e.path(), Some("tables[0].count")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/system/server_status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).server_status().await.unwrap_err();
    assert_eq!(err.code(), "TD_MALFORMED_RESPONSE");
}

#[tokio::test]
async fn test_path_segments_are_escaped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/table/list/my%20db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "my db",
            "tables": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tables = client_for(&server).list_tables("my db").await.unwrap();
    assert!(tables.is_empty());
}

#[tokio::test]
async fn test_job_status_with_null_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/job/status/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "12345",
            "status": "running",
            "created_at": "2014-01-01 00:00:00 UTC",
            "start_at": "2014-01-01 00:00:05 UTC",
            "end_at": null
        })))
        .mount(&server)
        .await;

    let status = client_for(&server).job_status("12345").await.unwrap();
    assert_eq!(status.status, "running");
    assert!(status.start_at.is_some());
    assert!(status.end_at.is_none());
    assert!(!status.is_finished());
}

// =============================================================================
// Status Mapping
// =============================================================================

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/database/delete/missing_db"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Resource not found",
            "message": "Database 'missing_db' does not exist"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).delete_database("missing_db").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.code(), "TD_API_NOT_FOUND");
    assert!(err.to_string().contains("Database 'missing_db' does not exist"));
}

#[tokio::test]
async fn test_conflict_maps_to_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/database/create/sample_db"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "Name already exists"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_database("sample_db", &[])
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(err.api_kind(), Some(ApiErrorKind::AlreadyExists));
}

#[tokio::test]
async fn test_server_error_body_is_not_validated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/database/list"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_databases().await.unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::Server));
    assert!(err.to_string().contains("upstream unavailable"));
}

// =============================================================================
// Table Management
// =============================================================================

#[tokio::test]
async fn test_create_item_table_sends_primary_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/table/create/sample_db/users/item"))
        .and(body_string_contains("primary_key=id"))
        .and(body_string_contains("primary_key_type=string"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .create_item_table("sample_db", "users", "id", "string")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_schema_sends_column_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/table/update-schema/sample_db/www_access"))
        .and(body_string_contains(
            "schema=%5B%5B%22host%22%2C%22string%22%5D%2C%5B%22code%22%2C%22long%22%5D%5D",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let columns = [Column::new("host", "string"), Column::new("code", "long")];
    client_for(&server)
        .update_schema("sample_db", "www_access", &columns)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_table_returns_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/table/delete/sample_db/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "sample_db",
            "table": "users",
            "type": "item"
        })))
        .mount(&server)
        .await;

    let table_type = client_for(&server)
        .delete_table("sample_db", "users")
        .await
        .unwrap();
    assert_eq!(table_type, "item");
}

// =============================================================================
// Import
// =============================================================================

#[tokio::test]
async fn test_import_uploads_payload() {
    let server = MockServer::start().await;
    let payload = encode_json_rows(&[json!({"time": 1388534400, "host": "10.0.0.1"})]).unwrap();
    Mock::given(method("PUT"))
        .and(path("/v3/table/import/sample_db/www_access/msgpack"))
        .and(header("content-type", "application/octet-stream"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "sample_db",
            "table": "www_access",
            "elapsed_time": 0.25
        })))
        .expect(1)
        .mount(&server)
        .await;

    let elapsed = client_for(&server)
        .import(
            "sample_db",
            "www_access",
            "msgpack",
            ImportBlob::InMemory(payload),
            None,
        )
        .await
        .unwrap();
    assert_eq!(elapsed, 0.25);
}

#[tokio::test]
async fn test_import_gzip_format_requires_compressed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elapsed_time": 0})))
        .expect(0)
        .mount(&server)
        .await;

    let payload = encode_json_rows(&[json!({"time": 1388534400})]).unwrap();
    let err = client_for(&server)
        .import(
            "sample_db",
            "www_access",
            "msgpack.gz",
            ImportBlob::InMemory(payload),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TD_INVALID_INPUT");
    assert!(err.to_string().contains("msgpack.gz"));
}

#[tokio::test]
async fn test_import_with_unique_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v3/table/import_with_id/sample_db/www_access/batch-0001/msgpack.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elapsed_time": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("rows.msgpack.gz");
    std::fs::write(&file, b"\x1f\x8b").unwrap();

    let elapsed = client_for(&server)
        .import(
            "sample_db",
            "www_access",
            "msgpack.gz",
            ImportBlob::File(file),
            Some("batch-0001"),
        )
        .await
        .unwrap();
    assert_eq!(elapsed, 1.0);
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_submit_query_sends_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/job/issue/presto/sample_db"))
        .and(body_string_contains("query=SELECT+COUNT%281%29+FROM+www_access"))
        .and(body_string_contains("priority=1"))
        .and(body_string_contains("retry_limit=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "12345",
            "database": "sample_db"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::presto("SELECT COUNT(1) FROM www_access")
        .priority(1)
        .retry_limit(2);
    let job_id = client_for(&server)
        .submit_query("sample_db", &query)
        .await
        .unwrap();
    assert_eq!(job_id, "12345");
}

#[tokio::test]
async fn test_list_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/result/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"name": "out", "url": "mysql://host/db/table"}]
        })))
        .mount(&server)
        .await;

    let results = client_for(&server).list_results().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "mysql://host/db/table");
}

// =============================================================================
// Record Streams
// =============================================================================

#[tokio::test]
async fn test_job_result_streams_rows() {
    let server = MockServer::start().await;
    let rows = vec![json!([1, "a"]), json!([2, "b"]), json!([3, "c"])];
    Mock::given(method("GET"))
        .and(path("/v3/job/result/12345"))
        .and(query_param("format", "msgpack"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encode_json_rows(&rows).unwrap()))
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    let count = client_for(&server)
        .job_result_each("12345", |record| {
            seen.push(record.to_json());
            Ok::<(), std::io::Error>(())
        })
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(seen, rows);
}

#[tokio::test]
async fn test_tail_sends_window_and_decodes() {
    let server = MockServer::start().await;
    let rows = vec![json!({"time": 1388534400, "host": "10.0.0.1"})];
    Mock::given(method("POST"))
        .and(path("/v3/table/tail/sample_db/www_access"))
        .and(body_string_contains("format=msgpack"))
        .and(body_string_contains("count=1"))
        .and(body_string_contains("from=2014-01-01+00%3A00%3A00+UTC"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encode_json_rows(&rows).unwrap()))
        .expect(1)
        .mount(&server)
        .await;

    let options = TailOptions {
        count: Some(1),
        from: Some(Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()),
        to: None,
    };
    let mut stream = client_for(&server)
        .tail("sample_db", "www_access", &options)
        .await
        .unwrap();
    let record = stream.next_record().unwrap().unwrap();
    assert_eq!(record.get("host").and_then(Record::as_str), Some("10.0.0.1"));
    assert!(stream.next_record().unwrap().is_none());
}

#[tokio::test]
async fn test_truncated_result_stream_fails() {
    let server = MockServer::start().await;
    let mut body = encode_json_rows(&[json!([1, "a"]), json!([2, "b"])]).unwrap();
    body.truncate(body.len() - 1);
    Mock::given(method("GET"))
        .and(path("/v3/job/result/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let mut count = 0;
    let err = client_for(&server)
        .job_result_each("12345", |_| {
            count += 1;
            Ok::<(), std::io::Error>(())
        })
        .await
        .unwrap_err();
    assert_eq!(count, 1);
    assert_eq!(err.code(), "TD_MALFORMED_STREAM");
}
