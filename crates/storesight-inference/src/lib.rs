//! Client for the inference sidecar service.
//!
//! Person detection, appearance embedding and age/gender estimation run in
//! a separate service; this crate provides the HTTP client implementing the
//! pipeline's provider traits, plus the HTTP camera frame source.

pub mod camera;
pub mod client;
pub mod error;
pub mod types;

pub use camera::{decode_frame, CameraConfig, HttpCamera};
pub use client::{InferenceClient, InferenceConfig};
pub use error::{InferenceError, InferenceResult};
