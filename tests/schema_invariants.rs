//! Schema Invariant Tests
//!
//! Response validation invariants:
//! - Absent optional fields take their default, never an error
//! - Absent required fields fail with the exact field path
//! - Embedded documents validate against their inner descriptor
//! - Validation is deterministic and all-or-nothing

use chrono::{TimeZone, Utc};
use serde_json::json;
use td_client::api::{schemas, DatabaseInfo, TableInfo};
use td_client::schema::{
    validate, validate_json, FieldReader, Schema, SchemaErrorCode, SchemaValidator, Value,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn table_entry() -> serde_json::Value {
    json!({
        "id": 1001,
        "name": "www_access",
        "type": "log",
        "count": 5000,
        "created_at": "2014-01-01 00:00:00 UTC",
        "updated_at": "2014-01-02T00:00:00Z",
        "counter_updated_at": "2014-01-02 00:00:00 UTC",
        "last_log_timestamp": null,
        "estimated_storage_size": 4096,
        "schema": "[[\"host\",\"string\"],[\"code\",\"long\"]]",
        "expire_days": 30,
        "primary_key": "",
        "primary_key_type": "",
        "user_defined": "ignored"
    })
}

fn tables_body(entries: Vec<serde_json::Value>) -> serde_json::Value {
    json!({"database": "sample_db", "tables": entries})
}

fn tables_of(canonical: Value) -> Vec<TableInfo> {
    FieldReader::new(canonical, "").unwrap().take("tables").unwrap()
}

// =============================================================================
// Optional Defaults
// =============================================================================

/// A database entry without `organization` gets the empty string.
#[test]
fn test_databases_missing_organization_defaults() {
    let body = br#"{"databases":[{"name":"db1","count":3,"created_at":"2014-01-01T00:00:00Z","updated_at":"2014-01-01T00:00:00Z","permission":"owner"}]}"#;

    let canonical = validate_json(body, schemas::databases()).unwrap();
    let dbs: Vec<DatabaseInfo> = FieldReader::new(canonical, "")
        .unwrap()
        .take("databases")
        .unwrap();

    assert_eq!(dbs.len(), 1);
    let db = &dbs[0];
    assert_eq!(db.name, "db1");
    assert_eq!(db.organization, "");
    assert_eq!(db.count, 3);
    assert_eq!(db.created_at, Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(db.updated_at, db.created_at);
    assert_eq!(db.permission, "owner");
}

/// Every optional table field may be omitted at once.
#[test]
fn test_table_optional_fields_default() {
    let entry = json!({
        "id": 7,
        "name": "events",
        "created_at": "2014-01-01 00:00:00 UTC",
        "updated_at": "2014-01-01 00:00:00 UTC",
        "estimated_storage_size": 0
    });
    let canonical = validate(&tables_body(vec![entry]), schemas::tables()).unwrap();
    let table = &tables_of(canonical)[0];

    assert_eq!(table.table_type, "?");
    assert_eq!(table.count, 0);
    assert!(table.counter_updated_at.is_none());
    assert!(table.last_log_timestamp.is_none());
    assert!(table.schema.is_empty());
    assert_eq!(table.expire_days, 0);
    assert_eq!(table.primary_key, "");
    assert_eq!(table.primary_key_type, "");
}

/// A table missing only `primary_key_type` still validates.
#[test]
fn test_missing_primary_key_type_succeeds() {
    let mut entry = table_entry();
    entry.as_object_mut().unwrap().remove("primary_key_type");

    let canonical = validate(&tables_body(vec![entry]), schemas::tables()).unwrap();
    let table = &tables_of(canonical)[0];
    assert_eq!(table.primary_key_type, "");
    assert_eq!(table.id, 1001);
}

// =============================================================================
// Required Fields
// =============================================================================

/// A table missing `id` fails at `tables[0].id`.
#[test]
fn test_missing_table_id_names_path() {
    let mut entry = table_entry();
    entry.as_object_mut().unwrap().remove("id");

    let err = validate(&tables_body(vec![entry]), schemas::tables()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::SchemaMismatch);
    assert_eq!(err.path(), Some("tables[0].id"));
}

/// The failing index is reported, not the first element.
#[test]
fn test_failure_in_later_element_names_index() {
    let mut bad = table_entry();
    bad["count"] = json!("many");

    let err = validate(&tables_body(vec![table_entry(), bad]), schemas::tables()).unwrap_err();
    assert_eq!(err.path(), Some("tables[1].count"));
    let details = err.details().unwrap();
    assert_eq!(details.expected, "integer");
    assert_eq!(details.actual, "string");
}

/// A non-object body fails at the root.
#[test]
fn test_root_mismatch_reported_as_root() {
    let err = validate(&json!(["not", "an", "object"]), schemas::databases()).unwrap_err();
    assert_eq!(err.path(), Some("$root"));
}

// =============================================================================
// Embedded Documents
// =============================================================================

#[test]
fn test_embedded_schema_parsed() {
    let canonical = validate(&tables_body(vec![table_entry()]), schemas::tables()).unwrap();
    let table = &tables_of(canonical)[0];
    assert_eq!(
        table.schema,
        vec![
            vec!["host".to_string(), "string".to_string()],
            vec!["code".to_string(), "long".to_string()],
        ]
    );
}

#[test]
fn test_invalid_embedded_schema_is_malformed() {
    let mut entry = table_entry();
    entry["schema"] = json!("[[\"host\",");

    let err = validate(&tables_body(vec![entry]), schemas::tables()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::MalformedEmbeddedDocument);
    assert_eq!(err.path(), Some("tables[0].schema"));
}

#[test]
fn test_embedded_document_checked_against_inner() {
    let mut entry = table_entry();
    entry["schema"] = json!("[[\"host\", 1]]");

    let err = validate(&tables_body(vec![entry]), schemas::tables()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::SchemaMismatch);
    assert_eq!(err.path(), Some("tables[0].schema[0][1]"));
}

// =============================================================================
// Determinism & Atomicity
// =============================================================================

#[test]
fn test_validation_is_deterministic() {
    let validator = SchemaValidator::new();
    let body = tables_body(vec![table_entry(), table_entry()]);
    let first = validator.validate(&body, schemas::tables()).unwrap();
    for _ in 0..50 {
        assert_eq!(validator.validate(&body, schemas::tables()).unwrap(), first);
    }
}

#[test]
fn test_undeclared_fields_are_dropped() {
    let canonical = validate(&tables_body(vec![table_entry()]), schemas::tables()).unwrap();
    let entry = &canonical.get("tables").unwrap().as_sequence().unwrap()[0];
    assert!(entry.get("user_defined").is_none());
    assert!(entry.get("name").is_some());
}

#[test]
fn test_malformed_body_is_distinct_from_mismatch() {
    let err = validate_json(b"{\"databases\": [", schemas::databases()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::MalformedResponse);
}

#[test]
fn test_numeric_strings_normalize() {
    let schema = Schema::mapping([
        ("count", Schema::integer()),
        ("elapsed", Schema::float()),
        ("enabled", Schema::boolean()),
        ("at", Schema::timestamp()),
    ]);
    let canonical = validate(
        &json!({"count": "42", "elapsed": "1.5", "enabled": "true", "at": 1388534400}),
        &schema,
    )
    .unwrap();
    assert_eq!(canonical.get("count"), Some(&Value::Integer(42)));
    assert_eq!(canonical.get("elapsed"), Some(&Value::Float(1.5)));
    assert_eq!(canonical.get("enabled"), Some(&Value::Boolean(true)));
    assert_eq!(
        canonical.get("at").and_then(Value::as_timestamp),
        Some(Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap())
    );
}
