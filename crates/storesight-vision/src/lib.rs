//! Frame pipeline for in-store customer analytics.
//!
//! This crate provides:
//! - Provider traits for the pluggable stages (source, detector, tracker,
//!   embedder, face estimator)
//! - A greedy IoU tracker with track confirmation
//! - The canonical identity registry (re-identification by cosine distance)
//! - Dwell time integration and bounded demographic sampling
//! - Frame annotation and per-frame orchestration

pub mod annotate;
pub mod demographics;
pub mod dwell;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod providers;
pub mod registry;
pub mod tracker;

pub use annotate::{BasicAnnotator, FrameAnnotator};
pub use demographics::{DemographicAggregate, MAX_SAMPLES};
pub use dwell::DwellTracker;
pub use error::{VisionError, VisionResult};
pub use frame::Frame;
pub use pipeline::{encode_jpeg, FramePipeline, FrameReport, PipelineConfig};
pub use providers::{
    AppearanceEmbedder, Detection, FaceEstimator, FrameSource, PersonDetector, PersonTracker,
    TrackedPerson,
};
pub use registry::{
    CanonicalId, IdentityRegistry, IdentitySummary, RegistrySnapshot,
    DEFAULT_SIMILARITY_THRESHOLD,
};
pub use tracker::{IouTracker, IouTrackerConfig, PersonTrack};
