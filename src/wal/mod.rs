//! Write-Ahead Log (WAL) on an object store
//!
//! # Design Principles
//!
//! - One immutable object per record
//! - The store is the source of truth; the in-memory cursor is a hint
//! - Explicit failure over silent recovery
//!
//! # Invariants Enforced
//!
//! - Offsets are 1-based and assigned by exactly one successful put
//! - Every record carries a SHA-256 trailer over its header and payload
//! - A record's header offset equals the offset in its key
//! - Corruption is surfaced, never skipped or repaired

mod checksum;
mod errors;
mod key;
mod log;
mod reader;
mod record;

pub use checksum::{compute_checksum, verify_checksum, Checksum, CHECKSUM_SIZE};
pub use errors::{Severity, WalError, WalResult};
pub use key::{KeyCodec, OFFSET_DIGITS};
pub use log::Wal;
pub use reader::WalReader;
pub use record::{decode, encode, Record, HEADER_SIZE, MIN_ENVELOPE_SIZE, TRAILER_SIZE};
