//! Log controller
//!
//! Owns the append cursor and turns the object store into an ordered log:
//!
//! - `append` assigns `cursor + 1` and writes it with create-if-absent
//! - `read` fetches one offset and validates it
//! - `last_record` rebuilds the cursor from a full prefix listing
//!
//! The cursor is process-local and never authoritative. Within a process,
//! appends are serialized by the mutex that guards it. Across processes,
//! the store's create-if-absent precondition is the only exclusion: a
//! writer with a stale cursor gets `WriteConflict`, never an overwrite.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::errors::{WalError, WalResult};
use super::key::KeyCodec;
use super::reader::WalReader;
use super::record::{self, Record};
use crate::cancel::Cancellation;
use crate::store::{BucketStore, StoreError};

/// A write-ahead log stored as one object per record.
#[derive(Debug)]
pub struct Wal {
    store: Arc<dyn BucketStore>,
    bucket: String,
    keys: KeyCodec,
    /// Last assigned offset, 0 before the first record.
    cursor: Mutex<u64>,
}

impl Wal {
    /// Create a controller for a log known to be empty.
    ///
    /// The cursor starts at 0. Use [`Wal::open`] for a log that may already
    /// contain records.
    pub fn new(store: Arc<dyn BucketStore>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            keys: KeyCodec::new(prefix),
            cursor: Mutex::new(0),
        }
    }

    /// Create a controller and recover its cursor through tail discovery.
    ///
    /// An empty log starts at cursor 0. A corrupt tail record fails the open.
    pub async fn open(
        store: Arc<dyn BucketStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        cancel: &Cancellation,
    ) -> WalResult<Self> {
        let wal = Self::new(store, bucket, prefix);
        match wal.last_record(cancel).await {
            Ok(record) => {
                info!(
                    bucket = %wal.bucket,
                    prefix = wal.keys.prefix(),
                    offset = record.offset,
                    "tail discovered"
                );
            }
            Err(WalError::EmptyLog { .. }) => {
                info!(bucket = %wal.bucket, prefix = wal.keys.prefix(), "log is empty");
            }
            Err(e) => return Err(e),
        }
        Ok(wal)
    }

    /// The bucket holding the log.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key prefix of the log.
    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// The key codec of the log.
    pub fn keys(&self) -> &KeyCodec {
        &self.keys
    }

    /// Last assigned offset, or 0 if none.
    ///
    /// Waits for an in-flight append to finish.
    pub async fn last_offset(&self) -> u64 {
        *self.cursor.lock().await
    }

    /// The offset the next append will try to claim.
    pub async fn next_offset(&self) -> u64 {
        self.last_offset().await.saturating_add(1)
    }

    /// Appends `payload` as the next record and returns its offset.
    ///
    /// At most one append runs at a time per controller. On any error the
    /// cursor is unchanged. A failed or cancelled put may still have landed
    /// remotely; the next append would then see `WriteConflict`. Callers
    /// resolve that with [`Wal::last_record`], never by blind retry.
    ///
    /// # Errors
    ///
    /// - `WriteConflict` if the candidate offset is already written
    /// - `Cancelled` if the signal fires first
    /// - `Store` for any other store failure
    pub async fn append(&self, cancel: &Cancellation, payload: &[u8]) -> WalResult<u64> {
        let mut cursor = cancel.run(self.cursor.lock()).await?;

        let candidate = cursor
            .checked_add(1)
            .ok_or(WalError::OffsetExhausted { last: *cursor })?;
        let key = self.keys.encode(candidate);
        let envelope = record::encode(candidate, payload);

        match self
            .store
            .put_if_absent(cancel, &self.bucket, &key, envelope)
            .await
        {
            Ok(()) => {
                *cursor = candidate;
                debug!(bucket = %self.bucket, key = %key, offset = candidate, len = payload.len(), "appended");
                Ok(candidate)
            }
            Err(StoreError::ObjectAlreadyExists(_)) => {
                warn!(bucket = %self.bucket, key = %key, offset = candidate, "write conflict");
                Err(WalError::WriteConflict {
                    offset: candidate,
                    key,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads and validates the record at `offset`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing is stored at `offset`
    /// - `ShortRecord` / `ChecksumMismatch` if the object is corrupt
    /// - `OffsetMismatch` if the object's header names another offset
    pub async fn read(&self, cancel: &Cancellation, offset: u64) -> WalResult<Record> {
        let key = self.keys.encode(offset);
        let data = match self.store.get(cancel, &self.bucket, &key).await {
            Ok(data) => data,
            Err(StoreError::ObjectNotFound(_)) => {
                return Err(WalError::NotFound { offset, key });
            }
            Err(e) => return Err(e.into()),
        };

        let record = record::decode(&data).map_err(|e| {
            error!(bucket = %self.bucket, key = %key, len = data.len(), error = %e, "corrupt record");
            e
        })?;

        if record.offset != offset {
            error!(
                bucket = %self.bucket,
                key = %key,
                found = record.offset,
                "record header does not match its key"
            );
            return Err(WalError::OffsetMismatch {
                expected: offset,
                found: record.offset,
            });
        }

        debug!(bucket = %self.bucket, key = %key, len = record.payload.len(), "read");
        Ok(record)
    }

    /// Highest offset present under the prefix, by full listing.
    ///
    /// # Errors
    ///
    /// - `ParseError` if any listed key does not encode an offset
    /// - `EmptyLog` if the listing is empty
    pub async fn tail_offset(&self, cancel: &Cancellation) -> WalResult<u64> {
        let listing = self
            .store
            .list(cancel, &self.bucket, &self.keys.list_prefix())
            .await?;

        let mut count = 0usize;
        let mut max: Option<u64> = None;
        for entry in listing {
            let key = entry?;
            let offset = self.keys.decode(&key)?;
            max = Some(max.map_or(offset, |m| m.max(offset)));
            count += 1;
        }
        debug!(bucket = %self.bucket, prefix = self.keys.prefix(), count, "listed");

        max.ok_or_else(|| WalError::EmptyLog {
            prefix: self.keys.prefix().to_string(),
        })
    }

    /// Returns the last record and resets the cursor to its offset.
    ///
    /// This is a full scan of the prefix, meant for startup and recovery.
    /// The cursor is refreshed even when the tail record turns out to be
    /// corrupt, but not when the call is cancelled. If an append on this
    /// controller moved the cursor during the scan, the cursor only moves
    /// forward.
    pub async fn last_record(&self, cancel: &Cancellation) -> WalResult<Record> {
        let observed = *cancel.run(self.cursor.lock()).await?;
        let tail = self.tail_offset(cancel).await?;
        let result = self.read(cancel, tail).await;
        if matches!(result, Err(WalError::Cancelled(_))) {
            return result;
        }

        let mut cursor = cancel.run(self.cursor.lock()).await?;
        let refreshed = if *cursor == observed {
            tail
        } else {
            (*cursor).max(tail)
        };
        if *cursor != refreshed {
            debug!(bucket = %self.bucket, from = *cursor, to = refreshed, "cursor refreshed");
        }
        *cursor = refreshed;
        drop(cursor);

        result
    }

    /// A sequential reader starting at offset `from` (offsets are 1-based).
    pub fn reader(&self, from: u64) -> WalReader<'_> {
        WalReader::new(self, from)
    }
}
