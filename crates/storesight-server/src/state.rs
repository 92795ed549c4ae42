//! Shared application state.

use tokio::sync::{broadcast, watch};

use crate::config::ServerConfig;

/// Capacity of the annotated-frame broadcast channel. A viewer that falls
/// further behind than this skips to the live edge instead of backing up
/// the pipeline.
pub const FRAME_CHANNEL_CAPACITY: usize = 8;

/// State shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Annotated frames as base64 JPEG text, fanned out to stream viewers
    pub frames: broadcast::Sender<String>,
    /// Flips to true when the server is going down
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(config: ServerConfig, shutdown: watch::Receiver<bool>) -> Self {
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            config,
            frames,
            shutdown,
        }
    }
}
