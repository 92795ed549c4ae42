//! Sync error types.

use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(#[from] storesight_storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
