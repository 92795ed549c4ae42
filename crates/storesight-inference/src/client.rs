//! Inference sidecar HTTP client.
//!
//! The person detector, appearance embedder and age/gender estimator run in
//! a sidecar service; this client speaks its JSON API (base64 JPEG in,
//! typed results out) and implements the pipeline's provider traits.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use storesight_models::{BoundingBox, Embedding, FaceObservation};
use storesight_vision::{
    encode_jpeg, AppearanceEmbedder, Detection, FaceEstimator, Frame, PersonDetector, VisionError,
    VisionResult,
};

use crate::error::{InferenceError, InferenceResult};
use crate::types::{DetectResponse, EmbedResponse, FacesResponse, FrameRequest, HealthResponse};

/// JPEG quality for frames posted to the sidecar.
const UPLOAD_JPEG_QUALITY: u8 = 90;

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL of the inference service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Max retries for transport failures and 5xx responses
    pub max_retries: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(3),
            max_retries: 2,
        }
    }
}

impl InferenceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("INFERENCE_URL").unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(
                std::env::var("INFERENCE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("INFERENCE_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            ),
            max_retries: std::env::var("INFERENCE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the inference sidecar. Cheap to clone; the underlying HTTP
/// pool is shared.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    config: InferenceConfig,
}

impl InferenceClient {
    /// Create a new inference client.
    pub fn new(config: InferenceConfig) -> InferenceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(InferenceError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> InferenceResult<Self> {
        Self::new(InferenceConfig::from_env())
    }

    /// Check if the inference service is healthy.
    pub async fn health_check(&self) -> InferenceResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("inference health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("inference health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Detect people in a full frame.
    pub async fn detect(&self, frame: &Frame) -> InferenceResult<Vec<Detection>> {
        let response: DetectResponse = self.post_frame("/detect", frame).await?;
        Ok(response
            .detections
            .into_iter()
            .map(|d| Detection::new(BoundingBox::new(d.x, d.y, d.width, d.height), d.confidence))
            .collect())
    }

    /// Compute the appearance embedding for a person crop.
    pub async fn embed(&self, crop: &Frame) -> InferenceResult<Embedding> {
        let response: EmbedResponse = self.post_frame("/embed", crop).await?;
        if response.embedding.is_empty() {
            return Err(InferenceError::InvalidResponse(
                "empty embedding".to_string(),
            ));
        }
        Ok(Embedding::new(response.embedding))
    }

    /// Estimate age and gender for faces inside a person crop.
    pub async fn faces(&self, crop: &Frame) -> InferenceResult<Vec<FaceObservation>> {
        let response: FacesResponse = self.post_frame("/faces", crop).await?;
        Ok(response
            .faces
            .into_iter()
            .map(|f| FaceObservation::new(f.age, f.gender, f.confidence))
            .collect())
    }

    /// POST a frame as base64 JPEG and parse the JSON response.
    async fn post_frame<T: DeserializeOwned>(
        &self,
        path: &str,
        frame: &Frame,
    ) -> InferenceResult<T> {
        let jpeg = encode_jpeg(frame, UPLOAD_JPEG_QUALITY)
            .map_err(|e| InferenceError::Encode(e.to_string()))?;
        let request = FrameRequest {
            image: STANDARD.encode(jpeg),
        };
        let url = format!("{}{}", self.config.base_url, path);

        debug!(url = %url, "inference request");

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(InferenceError::Network)?;

                if response.status().is_server_error() {
                    return Err(InferenceError::ServiceUnavailable(format!(
                        "inference service returned {}",
                        response.status()
                    )));
                }
                Ok(response)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed(format!(
                "inference service returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Execute with retry logic (exponential backoff from 500ms).
    async fn with_retry<F, Fut, T>(&self, operation: F) -> InferenceResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = InferenceResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "inference request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| InferenceError::RequestFailed("unknown error".to_string())))
    }
}

#[async_trait]
impl PersonDetector for InferenceClient {
    async fn detect(&self, frame: &Frame) -> VisionResult<Vec<Detection>> {
        InferenceClient::detect(self, frame)
            .await
            .map_err(|e| VisionError::detection(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "inference_detect"
    }
}

#[async_trait]
impl AppearanceEmbedder for InferenceClient {
    async fn embed(&self, crop: &Frame) -> VisionResult<Embedding> {
        InferenceClient::embed(self, crop)
            .await
            .map_err(|e| VisionError::embedding(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "inference_embed"
    }
}

#[async_trait]
impl FaceEstimator for InferenceClient {
    async fn estimate(&self, crop: &Frame) -> VisionResult<Vec<FaceObservation>> {
        InferenceClient::faces(self, crop)
            .await
            .map_err(|e| VisionError::face_estimation(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "inference_faces"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
    }
}
