//! # S3-Compatible Backend
//!
//! Wraps an [`object_store::ObjectStore`] bound to a single bucket. The
//! create-if-absent put maps to `PutMode::Create`, which the AWS client
//! sends as a conditional request.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::path::Path;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload};
use tracing::debug;

use super::backend::{BucketStore, Listing};
use super::config::S3StoreConfig;
use super::errors::{StoreError, StoreResult};
use crate::cancel::Cancellation;

/// Object store backend for S3 and S3-compatible services such as MinIO.
#[derive(Debug)]
pub struct S3Store {
    bucket: String,
    inner: Arc<dyn ObjectStore>,
}

impl S3Store {
    /// Build an AWS S3 client for `bucket`.
    ///
    /// Unset credentials and region fall back to the `AWS_*` environment.
    pub fn connect(bucket: &str, config: &S3StoreConfig) -> StoreResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_allow_http(config.allow_http)
            .with_conditional_put(S3ConditionalPut::ETagMatch);
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(access_key_id) = &config.access_key_id {
            builder = builder.with_access_key_id(access_key_id);
        }
        if let Some(secret_access_key) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret_access_key);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::Backend(format!("Failed to create S3 client: {}", e)))?;
        Ok(Self::from_object_store(bucket, Arc::new(store)))
    }

    /// Use an already constructed object store as the contents of `bucket`.
    pub fn from_object_store(bucket: impl Into<String>, inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            inner,
        }
    }

    fn check_bucket(&self, bucket: &str) -> StoreResult<()> {
        if bucket == self.bucket {
            Ok(())
        } else {
            Err(StoreError::BucketNotFound(bucket.to_string()))
        }
    }
}

fn map_error(key: &str, e: object_store::Error) -> StoreError {
    match e {
        object_store::Error::NotFound { .. } => StoreError::ObjectNotFound(key.to_string()),
        object_store::Error::AlreadyExists { .. } | object_store::Error::Precondition { .. } => {
            StoreError::ObjectAlreadyExists(key.to_string())
        }
        object_store::Error::InvalidPath { .. } => StoreError::InvalidKey(key.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl BucketStore for S3Store {
    async fn put_if_absent(
        &self,
        cancel: &Cancellation,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        self.check_bucket(bucket)?;
        debug!(bucket, key, len = data.len(), "s3 put_if_absent");
        let opts = PutOptions {
            mode: PutMode::Create,
            ..Default::default()
        };
        cancel
            .run(self.inner.put_opts(&Path::from(key), PutPayload::from(data), opts))
            .await?
            .map(|_| ())
            .map_err(|e| map_error(key, e))
    }

    async fn get(&self, cancel: &Cancellation, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        self.check_bucket(bucket)?;
        let fetch = async {
            let result = self.inner.get(&Path::from(key)).await?;
            result.bytes().await
        };
        cancel
            .run(fetch)
            .await?
            .map(|bytes| bytes.to_vec())
            .map_err(|e| map_error(key, e))
    }

    async fn list(&self, cancel: &Cancellation, bucket: &str, prefix: &str) -> StoreResult<Listing> {
        self.check_bucket(bucket)?;
        debug!(bucket, prefix, "s3 list");

        // object_store lists by path segment; the exact string prefix is
        // re-applied to each returned key.
        let trimmed = prefix.trim_end_matches('/');
        let segment_prefix = (!trimmed.is_empty()).then(|| Path::from(trimmed));

        let collect = async {
            let mut listing = Vec::new();
            let mut stream = self.inner.list(segment_prefix.as_ref());
            while let Some(entry) = stream.next().await {
                match entry {
                    Ok(meta) => {
                        let key = meta.location.to_string();
                        if key.starts_with(prefix) {
                            listing.push(Ok(key));
                        }
                    }
                    Err(e) => listing.push(Err(map_error(prefix, e))),
                }
            }
            listing
        };
        Ok(cancel.run(collect).await?)
    }
}
