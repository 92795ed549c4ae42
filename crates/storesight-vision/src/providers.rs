//! Provider traits for the pluggable pipeline stages.
//!
//! Detection, embedding and face estimation run in external models reached
//! over HTTP in production; these traits give the pipeline a uniform
//! interface and let tests substitute deterministic fakes.

use async_trait::async_trait;

use storesight_models::{BoundingBox, Embedding, FaceObservation};

use crate::error::VisionResult;
use crate::frame::Frame;

/// A detected person in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Detector confidence (0.0-1.0)
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// A confirmed track reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPerson {
    /// Transient track identifier; unique for the process lifetime
    pub track_id: u32,
    pub bbox: BoundingBox,
}

/// Pull-based source of camera frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Fetch and decode the next frame.
    async fn next_frame(&self) -> VisionResult<Frame>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Person detection provider.
#[async_trait]
pub trait PersonDetector: Send + Sync {
    /// Detect people in a frame.
    async fn detect(&self, frame: &Frame) -> VisionResult<Vec<Detection>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Multi-object tracker over per-frame detections.
///
/// Pure state machine, not async: implementations hold their own track
/// state and are driven by the pipeline's single processing task.
pub trait PersonTracker: Send + Sync {
    /// Advance the tracker by one frame of detections and return the
    /// confirmed tracks.
    fn update(&mut self, detections: &[Detection]) -> Vec<TrackedPerson>;

    /// Tracker name for logging.
    fn name(&self) -> &'static str;
}

/// Appearance embedding provider for re-identification.
#[async_trait]
pub trait AppearanceEmbedder: Send + Sync {
    /// Compute the appearance embedding for a person crop.
    async fn embed(&self, crop: &Frame) -> VisionResult<Embedding>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Face age/gender estimation provider.
#[async_trait]
pub trait FaceEstimator: Send + Sync {
    /// Estimate age and gender for every face inside a person crop.
    ///
    /// The pipeline samples only the first returned face per frame.
    async fn estimate(&self, crop: &Frame) -> VisionResult<Vec<FaceObservation>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
