//! # Object Store
//!
//! The seam between the log and its durable medium. The log only needs
//! three calls: create-if-absent put, get by key and recursive list by
//! prefix. Connection handling, credentials and retries belong to the
//! backends.

pub mod backend;
pub mod config;
pub mod errors;
pub mod factory;
pub mod local;
pub mod memory;
pub mod s3;

pub use backend::{BucketStore, Listing};
pub use config::{LocalStoreConfig, S3StoreConfig, StoreConfig};
pub use errors::{StoreError, StoreResult};
pub use factory::create_store;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;
