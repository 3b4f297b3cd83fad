//! Store configuration types.
//!
//! Selects the backend the log writes to. Deserialized from the `store`
//! section of the CLI config file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Backend selection, tagged by `type`.
///
/// Defaults to `InMemory`.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Process-local store, lost on exit. Useful for testing.
    #[default]
    InMemory,

    /// One file per object under a local directory.
    Local(LocalStoreConfig),

    /// AWS S3 or an S3-compatible service.
    S3(S3StoreConfig),
}

/// Local filesystem store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalStoreConfig {
    /// Root directory; buckets are its subdirectories.
    pub path: PathBuf,
}

/// S3 store configuration.
///
/// Every unset field falls back to the matching `AWS_*` environment
/// variable.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3StoreConfig {
    /// Region, e.g. "us-east-1".
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible services, e.g. "http://localhost:9000".
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Permit plain HTTP endpoints.
    #[serde(default)]
    pub allow_http: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}
