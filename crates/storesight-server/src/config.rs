//! Server configuration.

use std::path::PathBuf;

use storesight_vision::DEFAULT_SIMILARITY_THRESHOLD;

/// Top-level server configuration.
///
/// Camera and inference endpoints are owned by their crates
/// (`CameraConfig`, `InferenceConfig`); this struct covers the binding,
/// the pipeline knobs and the background services.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Root directory of the local snapshot spool
    pub snapshot_root: PathBuf,
    /// Optional zone layout file; the built-in storefront layout otherwise
    pub zone_layout_path: Option<PathBuf>,
    /// Cosine-distance threshold for re-identification
    pub similarity_threshold: f32,
    /// Minimum detector confidence fed to the tracker
    pub detection_confidence: f64,
    /// JPEG quality of the annotated stream (1-100)
    pub jpeg_quality: u8,
    /// Milliseconds between processed frames
    pub frame_interval_ms: u64,
    /// Run the background S3 sync
    pub sync_enabled: bool,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8766,
            snapshot_root: PathBuf::from("temp"),
            zone_layout_path: None,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            detection_confidence: 0.5,
            jpeg_quality: 80,
            frame_interval_ms: 250,
            sync_enabled: true,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8766),
            snapshot_root: std::env::var("SNAPSHOT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("temp")),
            zone_layout_path: std::env::var("ZONE_LAYOUT_PATH").ok().map(PathBuf::from),
            similarity_threshold: std::env::var("SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
            detection_confidence: std::env::var("DETECTION_CONFIDENCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),
            jpeg_quality: std::env::var("STREAM_JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(80),
            frame_interval_ms: std::env::var("FRAME_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(250),
            sync_enabled: std::env::var("SYNC_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8766);
        assert_eq!(config.snapshot_root, PathBuf::from("temp"));
        assert!(config.zone_layout_path.is_none());
        assert_eq!(config.frame_interval_ms, 250);
        assert!(config.sync_enabled);
        assert!(config.metrics_enabled);
    }
}
