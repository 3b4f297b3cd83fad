//! CLI module for s3wal
//!
//! Provides command-line access to a log:
//! - append: write one record
//! - read: print one record
//! - tail: print the last record
//! - replay: print records in order

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{append, read, replay, run_command, tail, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{record_json, write_json};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command).await
}
