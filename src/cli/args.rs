//! CLI argument definitions using clap
//!
//! Commands:
//! - s3wal append --config <path> <payload>
//! - s3wal read --config <path> <offset>
//! - s3wal tail --config <path>
//! - s3wal replay --config <path> [--from <offset>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// s3wal - a write-ahead log stored in an S3-compatible object store
#[derive(Parser, Debug)]
#[command(name = "s3wal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append one record and print its offset
    Append {
        /// Path to configuration file
        #[arg(long, default_value = "./s3wal.json")]
        config: PathBuf,

        /// Record payload
        payload: String,
    },

    /// Print the record at an offset
    Read {
        /// Path to configuration file
        #[arg(long, default_value = "./s3wal.json")]
        config: PathBuf,

        /// Record offset (1-based)
        offset: u64,
    },

    /// Print the last record of the log
    Tail {
        /// Path to configuration file
        #[arg(long, default_value = "./s3wal.json")]
        config: PathBuf,
    },

    /// Print records in order until the first missing offset
    Replay {
        /// Path to configuration file
        #[arg(long, default_value = "./s3wal.json")]
        config: PathBuf,

        /// First offset to print
        #[arg(long, default_value_t = 1)]
        from: u64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
