//! # Object Store Trait

use async_trait::async_trait;

use super::errors::StoreResult;
use crate::cancel::Cancellation;

/// Keys returned by a listing. Each entry may carry its own error.
pub type Listing = Vec<StoreResult<String>>;

/// The three object store calls the log depends on.
///
/// Every call receives the caller's [`Cancellation`] and must stop waiting
/// on the backend once it fires, returning `StoreError::Cancelled`.
#[async_trait]
pub trait BucketStore: Send + Sync + std::fmt::Debug {
    /// Write `data` under `key` only if no object exists there yet.
    ///
    /// Fails with `StoreError::ObjectAlreadyExists` instead of overwriting.
    async fn put_if_absent(
        &self,
        cancel: &Cancellation,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> StoreResult<()>;

    /// Read the full object at `key`. `StoreError::ObjectNotFound` if absent.
    async fn get(&self, cancel: &Cancellation, bucket: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// List every key starting with `prefix`, recursively.
    async fn list(&self, cancel: &Cancellation, bucket: &str, prefix: &str) -> StoreResult<Listing>;
}
