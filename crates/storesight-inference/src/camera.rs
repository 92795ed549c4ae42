//! HTTP camera frame source.
//!
//! Pulls JPEG snapshots from a camera's HTTP endpoint and decodes them into
//! RGB frames. A failed fetch surfaces as a frame-source error; the pipeline
//! loop logs it and tries again on the next tick.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use storesight_vision::{Frame, FrameSource, VisionError, VisionResult};

use crate::error::{InferenceError, InferenceResult};

/// Configuration for the HTTP camera.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Snapshot endpoint URL
    pub url: String,
    /// Per-fetch timeout
    pub timeout: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/snapshot".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl CameraConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("CAMERA_URL").unwrap_or(defaults.url),
            timeout: Duration::from_secs(
                std::env::var("CAMERA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Frame source over an HTTP snapshot endpoint.
pub struct HttpCamera {
    http: Client,
    config: CameraConfig,
}

impl HttpCamera {
    /// Create a new HTTP camera source.
    pub fn new(config: CameraConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(InferenceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> InferenceResult<Self> {
        Self::new(CameraConfig::from_env())
    }

    async fn fetch(&self) -> InferenceResult<Frame> {
        let response = self
            .http
            .get(&self.config.url)
            .send()
            .await
            .map_err(InferenceError::Network)?;

        if !response.status().is_success() {
            return Err(InferenceError::RequestFailed(format!(
                "camera returned {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(InferenceError::Network)?;
        debug!(bytes = bytes.len(), "camera snapshot fetched");
        decode_frame(&bytes)
    }
}

/// Decode an encoded image (JPEG or PNG) into an RGB frame.
pub fn decode_frame(bytes: &[u8]) -> InferenceResult<Frame> {
    let img = image::load_from_memory(bytes).map_err(|e| InferenceError::Decode(e.to_string()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Frame::new(width, height, rgb.into_raw()).map_err(|e| InferenceError::Decode(e.to_string()))
}

#[async_trait]
impl FrameSource for HttpCamera {
    async fn next_frame(&self) -> VisionResult<Frame> {
        self.fetch()
            .await
            .map_err(|e| VisionError::frame_source(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "http_camera"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storesight_vision::encode_jpeg;

    #[test]
    fn test_config_defaults() {
        let config = CameraConfig::default();
        assert_eq!(config.url, "http://localhost:8080/snapshot");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_decode_round_trips_jpeg() {
        let frame = Frame::filled(64, 48, [120, 130, 140]);
        let jpeg = encode_jpeg(&frame, 90).unwrap();
        let decoded = decode_frame(&jpeg).unwrap();
        assert_eq!(decoded.width, 64);
        assert_eq!(decoded.height, 48);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_frame(b"not an image").unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }
}
