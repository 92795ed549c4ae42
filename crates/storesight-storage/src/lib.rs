//! S3 storage client and the local snapshot spool.
//!
//! This crate provides:
//! - S3 get/put/delete for per-day analytics objects
//! - Bucket reachability checks for startup
//! - A local spool of per-day snapshot folders awaiting upload
//! - Retention pruning of expired day folders

pub mod client;
pub mod error;
pub mod snapshot;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use snapshot::{SnapshotKind, SnapshotStore};
