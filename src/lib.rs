//! s3wal - a write-ahead log persisted in an S3-compatible object store
//!
//! Every record is stored as one immutable object whose key encodes the
//! record offset. Lexicographic key order equals offset order, so the log
//! can be rebuilt from nothing but a prefix listing.
//!
//! # Layout
//!
//! - `wal`: key and envelope codecs, the log controller and a replay reader
//! - `store`: the object store seam and its in-memory, local and S3 backends
//! - `cancel`: cancellation tokens and deadlines forwarded to store calls
//! - `cli`: the `s3wal` command-line tool

pub mod cancel;
pub mod cli;
pub mod store;
pub mod wal;
