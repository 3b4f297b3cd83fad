//! # Object Store Errors

use thiserror::Error;

use crate::cancel::CancelReason;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Object store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    // Bucket errors
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Bucket already exists: {0}")]
    BucketAlreadyExists(String),

    // Object errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// A create-if-absent put found the key already taken.
    #[error("Object already exists: {0}")]
    ObjectAlreadyExists(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // Caller-side interruption
    #[error("Operation {0}")]
    Cancelled(CancelReason),

    // Transport / backend errors
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True if the error is the "key absent" outcome of a get.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ObjectNotFound(_))
    }

    /// True if the error is a failed create-if-absent precondition.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::ObjectAlreadyExists(_))
    }
}

impl From<CancelReason> for StoreError {
    fn from(reason: CancelReason) -> Self {
        StoreError::Cancelled(reason)
    }
}
