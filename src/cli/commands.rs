//! CLI command implementations
//!
//! Each command loads the config, builds the store backend and runs one
//! log operation under a cancellation that fires on Ctrl-C or after the
//! configured timeout.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::cancel::Cancellation;
use crate::store::{create_store, BucketStore, StoreConfig};
use crate::wal::Wal;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{record_json, write_json};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bucket holding the log (required)
    pub bucket: String,

    /// Key prefix of the log (optional, default "wal")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Store backend (optional, default in-memory)
    #[serde(default)]
    pub store: StoreConfig,

    /// Deadline for a whole command in milliseconds (optional, default none)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_prefix() -> String {
    "wal".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.bucket.is_empty() {
            return Err(CliError::config_error("bucket must not be empty"));
        }

        if self.prefix.is_empty() {
            return Err(CliError::config_error("prefix must not be empty"));
        }
        if self.prefix.starts_with('/') || self.prefix.ends_with('/') {
            return Err(CliError::config_error(format!(
                "Invalid prefix: '{}'. It must not start or end with '/'.",
                self.prefix
            )));
        }

        if self.timeout_ms == Some(0) {
            return Err(CliError::config_error("timeout_ms must be > 0"));
        }

        Ok(())
    }

    /// Command deadline, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Run a parsed command
pub async fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Append { config, payload } => append(&config, payload.as_bytes()).await,
        Command::Read { config, offset } => read(&config, offset).await,
        Command::Tail { config } => tail(&config).await,
        Command::Replay { config, from } => replay(&config, from).await,
    }
}

/// Append one record, recovering the cursor from the store first.
pub async fn append(config_path: &Path, payload: &[u8]) -> CliResult<()> {
    let (config, store, cancel) = prepare(config_path)?;
    let wal = Wal::open(store, &config.bucket, &config.prefix, &cancel).await?;

    let offset = wal.append(&cancel, payload).await?;
    info!(offset, "record appended");
    write_json(&json!({ "offset": offset }))
}

/// Print the record at `offset`.
pub async fn read(config_path: &Path, offset: u64) -> CliResult<()> {
    let (config, store, cancel) = prepare(config_path)?;
    let wal = Wal::new(store, &config.bucket, &config.prefix);

    let record = wal.read(&cancel, offset).await?;
    write_json(&record_json(&record))
}

/// Print the last record.
pub async fn tail(config_path: &Path) -> CliResult<()> {
    let (config, store, cancel) = prepare(config_path)?;
    let wal = Wal::new(store, &config.bucket, &config.prefix);

    let record = wal.last_record(&cancel).await?;
    write_json(&record_json(&record))
}

/// Print records from `from` until the first missing offset.
pub async fn replay(config_path: &Path, from: u64) -> CliResult<()> {
    let (config, store, cancel) = prepare(config_path)?;
    let wal = Wal::new(store, &config.bucket, &config.prefix);

    let mut reader = wal.reader(from);
    let mut count = 0u64;
    while let Some(record) = reader.read_next(&cancel).await? {
        write_json(&record_json(&record))?;
        count += 1;
    }
    info!(from, count, "replay finished");
    Ok(())
}

fn prepare(config_path: &Path) -> CliResult<(Config, Arc<dyn BucketStore>, Cancellation)> {
    let config = Config::load(config_path)?;
    debug!(store = ?config.store, bucket = %config.bucket, prefix = %config.prefix, "config loaded");

    let store = create_store(&config.store, &config.bucket)?;
    let cancel = command_cancellation(config.timeout());
    Ok((config, store, cancel))
}

/// Cancellation that fires on Ctrl-C or when `timeout` elapses.
fn command_cancellation(timeout: Option<Duration>) -> Cancellation {
    let mut cancel = Cancellation::new();
    if let Some(timeout) = timeout {
        cancel = cancel.with_timeout(timeout);
    }

    let token = cancel.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}
