//! CLI command implementations
//!
//! Each subcommand is a thin wrapper over one `TdClient` call. Results go to
//! stdout as JSON; logs and errors go to stderr.

use std::io;

use serde_json::json;

use crate::api::{ImportBlob, Query, TailOptions, TdClient};
use crate::config::{ClientConfig, API_KEY_ENV};
use crate::stream::Record;

use super::args::{Cli, Command, GlobalArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_json_line, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli).await
}

/// Resolve configuration, build the client and run one command
pub async fn run_command(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli.global)?;
    config.apply_log_level();
    let client = TdClient::new(config)?;
    execute(&client, cli.command).await
}

/// Merge configuration sources: flags over file over environment
pub fn resolve_config(global: &GlobalArgs) -> CliResult<ClientConfig> {
    resolve_config_from(global, |name| std::env::var(name).ok())
}

pub fn resolve_config_from<F>(global: &GlobalArgs, lookup: F) -> CliResult<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match global.config {
        Some(ref path) => {
            let mut config = ClientConfig::load(path)?;
            // The file may leave the key to the environment
            if config.api_key.is_none() {
                config.api_key = lookup(API_KEY_ENV).filter(|k| !k.is_empty());
            }
            config
        }
        None => ClientConfig::from_lookup(&lookup)?,
    };

    if let Some(ref endpoint) = global.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(ref api_key) = global.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(ref level) = global.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run one command against a client
pub async fn execute(client: &TdClient, command: Command) -> CliResult<()> {
    match command {
        Command::Status => write_response(&client.server_status().await?),
        Command::Account => write_response(&client.show_account().await?),
        Command::Databases => write_response(&client.list_databases().await?),
        Command::Tables { database } => write_response(&client.list_tables(&database).await?),
        Command::CreateDatabase { database } => {
            client.create_database(&database, &[]).await?;
            write_response(&json!({ "database": database }))
        }
        Command::DeleteDatabase { database } => {
            client.delete_database(&database).await?;
            write_response(&json!({ "database": database }))
        }
        Command::CreateTable {
            database,
            table,
            primary_key,
            primary_key_type,
        } => {
            let table_type = match (primary_key, primary_key_type) {
                (Some(key), Some(key_type)) => {
                    client
                        .create_item_table(&database, &table, &key, &key_type)
                        .await?;
                    "item"
                }
                _ => {
                    client.create_log_table(&database, &table).await?;
                    "log"
                }
            };
            write_response(&json!({ "database": database, "table": table, "type": table_type }))
        }
        Command::DeleteTable { database, table } => {
            let table_type = client.delete_table(&database, &table).await?;
            write_response(&json!({ "database": database, "table": table, "type": table_type }))
        }
        Command::SwapTable {
            database,
            table1,
            table2,
        } => {
            client.swap_table(&database, &table1, &table2).await?;
            write_response(&json!({ "database": database, "tables": [table1, table2] }))
        }
        Command::UpdateSchema {
            database,
            table,
            columns,
        } => {
            client.update_schema(&database, &table, &columns).await?;
            write_response(&json!({ "database": database, "table": table, "columns": columns.len() }))
        }
        Command::UpdateExpire {
            database,
            table,
            days,
        } => {
            client.update_expire(&database, &table, days).await?;
            write_response(&json!({ "database": database, "table": table, "expire_days": days }))
        }
        Command::Tail {
            database,
            table,
            count,
            from,
            to,
        } => {
            let options = TailOptions { count, from, to };
            client
                .tail_each(&database, &table, &options, print_record)
                .await?;
            Ok(())
        }
        Command::Import {
            database,
            table,
            file,
            format,
            unique_id,
        } => {
            if !file.is_file() {
                return Err(CliError::io_error(format!(
                    "Import file not found: {}",
                    file.display()
                )));
            }
            let elapsed = client
                .import(
                    &database,
                    &table,
                    &format,
                    ImportBlob::File(file),
                    unique_id.as_deref(),
                )
                .await?;
            write_response(&json!({ "elapsed_time": elapsed }))
        }
        Command::Query {
            database,
            query,
            query_type,
            result_url,
            priority,
            retry_limit,
        } => {
            let mut q = Query::new(query_type, query)
                .priority(priority)
                .retry_limit(retry_limit);
            if let Some(url) = result_url {
                q = q.result_url(url);
            }
            let job_id = client.submit_query(&database, &q).await?;
            write_response(&json!({ "job_id": job_id }))
        }
        Command::JobStatus { job_id } => write_response(&client.job_status(&job_id).await?),
        Command::JobResult { job_id } => {
            client.job_result_each(&job_id, print_record).await?;
            Ok(())
        }
        Command::Results => write_response(&client.list_results().await?),
    }
}

fn print_record(record: Record) -> io::Result<()> {
    write_json_line(&mut io::stdout().lock(), &record.to_json())
}
