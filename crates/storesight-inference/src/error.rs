//! Inference client error types.

use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image encode failed: {0}")]
    Encode(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InferenceError {
    /// Transport failures and 5xx responses are worth retrying; anything
    /// the service rejected outright is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceError::ServiceUnavailable(_) | InferenceError::Network(_)
        )
    }
}
