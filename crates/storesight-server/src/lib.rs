//! In-store analytics server.
//!
//! Wires the HTTP camera and inference sidecar into the frame pipeline,
//! fans the annotated stream out over WebSocket, spools per-day snapshot
//! files and runs the background S3 sync.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod pipeline_task;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ServerConfig;
pub use pipeline_task::PipelineTask;
pub use routes::create_router;
pub use state::{AppState, FRAME_CHANNEL_CAPACITY};
