//! Sequential WAL replay
//!
//! Reads records in offset order starting at a given offset. The first
//! missing offset ends the replay; every other failure, corruption
//! included, is returned as-is. Records are never skipped.

use super::errors::{WalError, WalResult};
use super::log::Wal;
use super::record::Record;
use crate::cancel::Cancellation;

/// WAL reader for sequential replay.
pub struct WalReader<'a> {
    wal: &'a Wal,
    /// Next offset to read, `None` once the offset space is exhausted
    next: Option<u64>,
    /// Set once a missing offset has been seen
    finished: bool,
}

impl<'a> WalReader<'a> {
    /// Offsets are 1-based, so `from == 0` starts at 1.
    pub(crate) fn new(wal: &'a Wal, from: u64) -> Self {
        Self {
            wal,
            next: Some(from.max(1)),
            finished: false,
        }
    }

    /// The offset the next call to [`WalReader::read_next`] will fetch.
    pub fn next_offset(&self) -> Option<u64> {
        if self.finished {
            None
        } else {
            self.next
        }
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read and validated
    /// - `Ok(None)` at the first offset with no object
    /// - `Err(WalError)` for corruption or store failures
    ///
    /// A failed read does not advance the reader; calling again retries the
    /// same offset.
    pub async fn read_next(&mut self, cancel: &Cancellation) -> WalResult<Option<Record>> {
        let Some(offset) = self.next_offset() else {
            return Ok(None);
        };

        match self.wal.read(cancel, offset).await {
            Ok(record) => {
                self.next = offset.checked_add(1);
                Ok(Some(record))
            }
            Err(WalError::NotFound { .. }) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reads every remaining record until the first missing offset.
    pub async fn collect_to_end(&mut self, cancel: &Cancellation) -> WalResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next(cancel).await? {
            records.push(record);
        }
        Ok(records)
    }
}
