//! Error types for pipeline operations.

use thiserror::Error;

/// Result type for pipeline operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while processing frames.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("invalid frame buffer: expected {expected} bytes for {width}x{height}, got {actual}")]
    InvalidFrameBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("crop region does not intersect the frame")]
    EmptyCrop,

    #[error("frame source failed: {0}")]
    FrameSource(String),

    #[error("person detection failed: {0}")]
    Detection(String),

    #[error("appearance embedding failed: {0}")]
    Embedding(String),

    #[error("face estimation failed: {0}")]
    FaceEstimation(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create a frame source error.
    pub fn frame_source(message: impl Into<String>) -> Self {
        Self::FrameSource(message.into())
    }

    /// Create a detection error.
    pub fn detection(message: impl Into<String>) -> Self {
        Self::Detection(message.into())
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a face estimation error.
    pub fn face_estimation(message: impl Into<String>) -> Self {
        Self::FaceEstimation(message.into())
    }

    /// Create an encoding error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
