//! Shared data models for the StoreSight analytics pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Pixel-space geometry (bounding boxes, IoU)
//! - Store zone layouts and zone location
//! - Age/gender demographics
//! - Appearance embeddings and cosine distance
//! - Daily snapshot records (customer and zone-visit JSON)

pub mod demographics;
pub mod embedding;
pub mod geometry;
pub mod snapshot;
pub mod zone;

// Re-export common types
pub use demographics::{AgeBracket, FaceObservation, Gender};
pub use embedding::{cosine_distance, Embedding};
pub use geometry::BoundingBox;
pub use snapshot::{
    day_key, format_first_seen, parse_day_key, round2, CustomerRecord, ZoneVisitRecord,
};
pub use zone::{Zone, ZoneLabel, ZoneLayout, ZoneLayoutError};
