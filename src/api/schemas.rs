//! Response descriptors for the JSON endpoints
//!
//! Built once on first use and shared for the life of the process.

use std::sync::OnceLock;

use crate::schema::{Schema, Value};

/// `{"status": ...}` from `/v3/system/server_status`
pub fn server_status() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::mapping([("status", Schema::string())]))
}

pub fn account() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::mapping([(
            "account",
            Schema::mapping([
                ("id", Schema::integer()),
                ("plan", Schema::integer()),
                ("storage_size", Schema::integer()),
                ("guaranteed_cores", Schema::integer()),
                ("maximum_cores", Schema::integer()),
                ("created_at", Schema::timestamp()),
            ]),
        )])
    })
}

pub fn databases() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::mapping([(
            "databases",
            Schema::sequence(Schema::mapping([
                ("name", Schema::string()),
                ("organization", Schema::optional(Schema::string(), "")),
                ("count", Schema::integer()),
                ("created_at", Schema::timestamp()),
                ("updated_at", Schema::timestamp()),
                ("permission", Schema::string()),
            ])),
        )])
    })
}

/// Column list as stored in a table's `schema` field: `[["name", "type"], ...]`
fn columns() -> Schema {
    Schema::embedded(Schema::sequence(Schema::sequence(Schema::string())))
}

pub fn tables() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::mapping([
            ("database", Schema::string()),
            (
                "tables",
                Schema::sequence(Schema::mapping([
                    ("id", Schema::integer()),
                    ("name", Schema::string()),
                    ("type", Schema::optional(Schema::string(), "?")),
                    ("count", Schema::optional(Schema::integer(), 0i64)),
                    ("created_at", Schema::timestamp()),
                    ("updated_at", Schema::timestamp()),
                    ("counter_updated_at", Schema::nullable(Schema::timestamp())),
                    ("last_log_timestamp", Schema::nullable(Schema::timestamp())),
                    ("estimated_storage_size", Schema::integer()),
                    ("schema", Schema::optional(columns(), Value::Sequence(Vec::new()))),
                    ("expire_days", Schema::optional(Schema::integer(), 0i64)),
                    ("primary_key", Schema::optional(Schema::string(), "")),
                    ("primary_key_type", Schema::optional(Schema::string(), "")),
                ])),
            ),
        ])
    })
}

pub fn delete_table() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::mapping([
            ("table", Schema::string()),
            ("database", Schema::string()),
            ("type", Schema::optional(Schema::string(), "?")),
        ])
    })
}

pub fn import() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::mapping([("elapsed_time", Schema::float())]))
}

pub fn job_issue() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| Schema::mapping([("job_id", Schema::string())]))
}

pub fn job_status() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::mapping([
            ("job_id", Schema::string()),
            ("status", Schema::string()),
            ("created_at", Schema::nullable(Schema::timestamp())),
            ("start_at", Schema::nullable(Schema::timestamp())),
            ("end_at", Schema::nullable(Schema::timestamp())),
        ])
    })
}

pub fn results() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::mapping([(
            "results",
            Schema::sequence(Schema::mapping([
                ("name", Schema::string()),
                ("url", Schema::string()),
            ])),
        )])
    })
}
