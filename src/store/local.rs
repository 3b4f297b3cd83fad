//! # Local Filesystem Backend
//!
//! Objects live at `<root>/<bucket>/<key>`. Writes are staged under
//! `<root>/.staging` and published with a hard link, which fails if the
//! target exists. Readers therefore never observe a partially written
//! object and an existing object is never replaced.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::backend::{BucketStore, Listing};
use super::errors::{StoreError, StoreResult};
use crate::cancel::Cancellation;

const STAGING_DIR: &str = ".staging";

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a new local backend rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> StoreResult<PathBuf> {
        if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(|c: char| c == '/' || c == '\\') {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        let mut path = self.bucket_path(bucket)?;
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StoreError::InvalidKey(key.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Publish `data` at `target` unless it already exists.
    ///
    /// Staging, sync and link run as one blocking task. Dropping the
    /// returned future does not stop it, so the staged file is always
    /// removed.
    async fn write_new(&self, target: PathBuf, data: Vec<u8>) -> StoreResult<()> {
        let staging = self.root.join(STAGING_DIR);
        tokio::task::spawn_blocking(move || publish(&staging, &target, &data))
            .await
            .map_err(|e| StoreError::IoError(format!("write task failed: {}", e)))?
    }

    async fn walk(&self, bucket_root: &Path, prefix: &str) -> Listing {
        let mut listing = Vec::new();
        let mut pending = vec![(bucket_root.to_path_buf(), String::new())];

        while let Some((dir, rel)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    listing.push(Err(io_error(e)));
                    continue;
                }
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        listing.push(Err(io_error(e)));
                        break;
                    }
                };
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    listing.push(Err(StoreError::InvalidKey(
                        entry.path().display().to_string(),
                    )));
                    continue;
                };
                let key = if rel.is_empty() {
                    name
                } else {
                    format!("{}/{}", rel, name)
                };
                match entry.file_type().await {
                    Ok(kind) if kind.is_dir() => {
                        // Only descend where keys can still match the prefix.
                        let dir_key = format!("{}/", key);
                        if dir_key.starts_with(prefix) || prefix.starts_with(&dir_key) {
                            pending.push((entry.path(), key));
                        }
                    }
                    Ok(_) => {
                        if key.starts_with(prefix) {
                            listing.push(Ok(key));
                        }
                    }
                    Err(e) => listing.push(Err(io_error(e))),
                }
            }
        }

        listing.sort_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.cmp(b),
            (Err(_), Ok(_)) => std::cmp::Ordering::Less,
            (Ok(_), Err(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });
        listing
    }
}

/// Removes a staging file when dropped.
struct StagedFile {
    path: PathBuf,
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn publish(staging: &Path, target: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::create_dir_all(staging).map_err(io_error)?;

    let staged = StagedFile {
        path: staging.join(Uuid::new_v4().to_string()),
    };
    let mut file = std::fs::File::create(&staged.path).map_err(io_error)?;
    file.write_all(data).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    drop(file);

    std::fs::hard_link(&staged.path, target).map_err(|e| {
        if e.kind() == ErrorKind::AlreadyExists {
            StoreError::ObjectAlreadyExists(target.display().to_string())
        } else {
            io_error(e)
        }
    })
}

fn io_error(e: std::io::Error) -> StoreError {
    StoreError::IoError(e.to_string())
}

#[async_trait]
impl BucketStore for LocalStore {
    async fn put_if_absent(
        &self,
        cancel: &Cancellation,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        let target = self.object_path(bucket, key)?;
        debug!(bucket, key, len = data.len(), "local put_if_absent");
        cancel
            .run(self.write_new(target, data))
            .await?
            .map_err(|e| match e {
                StoreError::ObjectAlreadyExists(_) => StoreError::ObjectAlreadyExists(key.to_string()),
                other => other,
            })
    }

    async fn get(&self, cancel: &Cancellation, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        cancel.run(fs::read(&path)).await?.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::ObjectNotFound(key.to_string())
            } else {
                io_error(e)
            }
        })
    }

    async fn list(&self, cancel: &Cancellation, bucket: &str, prefix: &str) -> StoreResult<Listing> {
        let bucket_root = self.bucket_path(bucket)?;
        debug!(bucket, prefix, "local list");
        Ok(cancel.run(self.walk(&bucket_root, prefix)).await?)
    }
}
