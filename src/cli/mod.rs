//! CLI module for tdc
//!
//! One subcommand per API operation:
//! - status, account, results
//! - databases, create-database, delete-database
//! - tables, create-table, delete-table, swap-table, update-schema, update-expire
//! - tail, import
//! - query, job-status, job-result

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, GlobalArgs};
pub use commands::{execute, resolve_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json_line, write_response};
