//! Background S3 sync for spooled snapshots.
//!
//! This crate provides:
//! - A periodic upload loop for the local snapshot spool
//! - Remote-merge append semantics for per-day S3 objects
//! - Retention pruning of expired day folders
//! - Graceful shutdown via a watch flag

pub mod config;
pub mod error;
pub mod service;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use service::{CycleReport, FailureStreak, SyncService};
