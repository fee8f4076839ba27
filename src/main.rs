//! tdc entry point
//!
//! Runs one command. Failures go to stderr and set the exit status by
//! error category.

use td_client::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("{}", e);
        std::process::exit(e.exit_status());
    }
}
