//! # In-Memory Backend

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{BucketStore, Listing};
use super::errors::{StoreError, StoreResult};
use crate::cancel::Cancellation;

type Objects = BTreeMap<String, Vec<u8>>;

/// Process-local object store with S3 bucket semantics.
///
/// Buckets must exist before objects can be written to them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, Objects>>,
}

impl MemoryStore {
    /// Create a store with no buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one empty bucket
    pub fn with_bucket(name: impl Into<String>) -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(name.into(), Objects::new());
        Self {
            buckets: RwLock::new(buckets),
        }
    }

    /// Create an empty bucket
    pub async fn create_bucket(&self, name: &str) -> StoreResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(StoreError::BucketAlreadyExists(name.to_string()));
        }
        buckets.insert(name.to_string(), Objects::new());
        Ok(())
    }

    /// Unconditionally replace the object at `key`.
    ///
    /// Bypasses the create-if-absent precondition; tests use it to plant
    /// corrupted or misplaced objects.
    pub async fn overwrite(&self, bucket: &str, key: &str, data: Vec<u8>) -> StoreResult<()> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    /// Remove the object at `key`
    pub async fn delete(&self, bucket: &str, key: &str) -> StoreResult<()> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))
    }

    /// Number of objects in `bucket`, 0 if the bucket does not exist
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn put_if_absent(
        &self,
        cancel: &Cancellation,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        let mut buckets = cancel.run(self.buckets.write()).await?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        if objects.contains_key(key) {
            return Err(StoreError::ObjectAlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, cancel: &Cancellation, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let buckets = cancel.run(self.buckets.read()).await?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))
    }

    async fn list(&self, cancel: &Cancellation, bucket: &str, prefix: &str) -> StoreResult<Listing> {
        let buckets = cancel.run(self.buckets.read()).await?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| Ok(key.clone()))
            .collect())
    }
}
