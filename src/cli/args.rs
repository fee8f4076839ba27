//! CLI argument definitions using clap
//!
//! Global flags (`--config`, `--endpoint`, `--api-key`, `--log-level`) apply
//! to every subcommand and override the configuration file, which in turn
//! overrides the environment.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Column;
use crate::schema::parse_timestamp;
use crate::schema::timestamp::from_unix_seconds;

/// tdc - command-line client for the analytics platform API
#[derive(Parser, Debug)]
#[command(name = "tdc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API server URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Minimum log severity on stderr
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show API server status
    Status,

    /// Show account information
    Account,

    /// List databases
    Databases,

    /// List tables in a database
    Tables { database: String },

    CreateDatabase { database: String },

    DeleteDatabase { database: String },

    /// Create a log table, or an item table when a primary key is given
    CreateTable {
        database: String,
        table: String,
        #[arg(long, requires = "primary_key_type")]
        primary_key: Option<String>,
        #[arg(long, requires = "primary_key")]
        primary_key_type: Option<String>,
    },

    DeleteTable { database: String, table: String },

    /// Swap the contents of two tables
    SwapTable {
        database: String,
        table1: String,
        table2: String,
    },

    /// Replace a table's columns, given as name:type
    UpdateSchema {
        database: String,
        table: String,
        #[arg(value_parser = parse_column, required = true)]
        columns: Vec<Column>,
    },

    /// Set the retention period of a table
    UpdateExpire {
        database: String,
        table: String,
        days: u32,
    },

    /// Print the newest rows of a table, one JSON object per line
    Tail {
        database: String,
        table: String,
        #[arg(long)]
        count: Option<u64>,
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,
    },

    /// Upload a bulk import file
    Import {
        database: String,
        table: String,
        /// Gzip-compressed MessagePack rows for the default format
        file: PathBuf,
        #[arg(long, default_value = "msgpack.gz")]
        format: String,
        /// Makes repeated uploads of the same payload idempotent
        #[arg(long)]
        unique_id: Option<String>,
    },

    /// Submit a query job and print its id
    Query {
        database: String,
        query: String,
        #[arg(long = "type", default_value = "hive")]
        query_type: String,
        #[arg(long)]
        result_url: Option<String>,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
        #[arg(long, default_value_t = 0)]
        retry_limit: u32,
    },

    JobStatus { job_id: String },

    /// Print a job's result rows, one JSON value per line
    JobResult { job_id: String },

    /// List saved result destinations
    Results,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Some(t) = parse_timestamp(s) {
        return Ok(t);
    }
    s.parse::<i64>()
        .ok()
        .and_then(from_unix_seconds)
        .ok_or_else(|| format!("'{}' is not a timestamp or Unix time", s))
}

fn parse_column(s: &str) -> Result<Column, String> {
    Column::parse(s).ok_or_else(|| format!("'{}' is not a name:type column", s))
}
