//! Store factory for creating backends from configuration.

use std::sync::Arc;

use tracing::info;

use super::backend::BucketStore;
use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::local::LocalStore;
use super::memory::MemoryStore;
use super::s3::S3Store;

/// Creates the backend described by `config`, serving `bucket`.
///
/// The in-memory backend is created with `bucket` already present. The
/// local backend creates its root directory if missing.
pub fn create_store(config: &StoreConfig, bucket: &str) -> StoreResult<Arc<dyn BucketStore>> {
    match config {
        StoreConfig::InMemory => {
            info!(bucket, "using in-memory store");
            Ok(Arc::new(MemoryStore::with_bucket(bucket)))
        }
        StoreConfig::Local(local) => {
            std::fs::create_dir_all(&local.path).map_err(|e| {
                StoreError::IoError(format!(
                    "Failed to create storage directory '{}': {}",
                    local.path.display(),
                    e
                ))
            })?;
            info!(bucket, path = %local.path.display(), "using local store");
            Ok(Arc::new(LocalStore::new(local.path.clone())))
        }
        StoreConfig::S3(s3) => {
            info!(bucket, endpoint = ?s3.endpoint, "using s3 store");
            Ok(Arc::new(S3Store::connect(bucket, s3)?))
        }
    }
}
