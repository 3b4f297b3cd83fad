//! WAL error types
//!
//! Every failure carries a stable code and a severity. Corruption kinds are
//! `Fatal`: the log must not skip, repair or paper over them. The rest are
//! `Error`: the operation failed but the log is intact.

use std::fmt;

use thiserror::Error;

use crate::cancel::CancelReason;
use crate::store::StoreError;

/// Severity levels for WAL errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the log is intact
    Error,
    /// Stored data is corrupt
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// WAL error type
#[derive(Debug, Error)]
pub enum WalError {
    /// Create-if-absent precondition failed: the offset is already written.
    #[error("write conflict: offset {offset} already exists at {key}")]
    WriteConflict { offset: u64, key: String },

    /// No object at the requested offset.
    #[error("record not found: offset {offset} at {key}")]
    NotFound { offset: u64, key: String },

    /// Object smaller than header plus checksum trailer.
    #[error("short record: {len} bytes, minimum envelope is {min} bytes")]
    ShortRecord { len: usize, min: usize },

    /// Header offset disagrees with the offset the object is keyed under.
    #[error("offset mismatch: expected {expected}, header carries {found}")]
    OffsetMismatch { expected: u64, found: u64 },

    /// Checksum trailer does not match header and payload.
    #[error("checksum mismatch: computed {computed}, stored {stored}")]
    ChecksumMismatch { computed: String, stored: String },

    /// Object key does not encode an offset.
    #[error("invalid object key {key:?}: {reason}")]
    ParseError { key: String, reason: String },

    /// Tail discovery found no objects under the prefix.
    #[error("log is empty: no objects under {prefix}/")]
    EmptyLog { prefix: String },

    /// The cursor is at `u64::MAX`; no further offset can be assigned.
    #[error("offset space exhausted after {last}")]
    OffsetExhausted { last: u64 },

    /// Caller cancellation or deadline.
    #[error("operation {0}")]
    Cancelled(CancelReason),

    /// Any other object store failure.
    #[error("object store error: {0}")]
    Store(StoreError),
}

impl WalError {
    pub(crate) fn parse(key: &str, reason: impl Into<String>) -> Self {
        WalError::ParseError {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            WalError::WriteConflict { .. } => "S3WAL_WRITE_CONFLICT",
            WalError::NotFound { .. } => "S3WAL_NOT_FOUND",
            WalError::ShortRecord { .. } => "S3WAL_SHORT_RECORD",
            WalError::OffsetMismatch { .. } => "S3WAL_OFFSET_MISMATCH",
            WalError::ChecksumMismatch { .. } => "S3WAL_CHECKSUM_MISMATCH",
            WalError::ParseError { .. } => "S3WAL_PARSE_ERROR",
            WalError::EmptyLog { .. } => "S3WAL_EMPTY_LOG",
            WalError::OffsetExhausted { .. } => "S3WAL_OFFSET_EXHAUSTED",
            WalError::Cancelled(_) => "S3WAL_CANCELLED",
            WalError::Store(_) => "S3WAL_STORE_ERROR",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        if self.is_corruption() {
            Severity::Fatal
        } else {
            Severity::Error
        }
    }

    /// True for checksum, offset and length violations in stored objects.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            WalError::ShortRecord { .. }
                | WalError::OffsetMismatch { .. }
                | WalError::ChecksumMismatch { .. }
        )
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<StoreError> for WalError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Cancelled(reason) => WalError::Cancelled(reason),
            other => WalError::Store(other),
        }
    }
}

impl From<CancelReason> for WalError {
    fn from(reason: CancelReason) -> Self {
        WalError::Cancelled(reason)
    }
}

/// Result type for WAL operations
pub type WalResult<T> = Result<T, WalError>;
