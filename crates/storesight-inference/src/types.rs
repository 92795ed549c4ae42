//! Inference service request/response types.

use serde::{Deserialize, Serialize};

use storesight_models::{AgeBracket, Gender};

/// Request body shared by every inference endpoint: one base64 JPEG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRequest {
    /// Base64-encoded JPEG image
    pub image: String,
}

/// One person detection as returned by `/detect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDto {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

/// Response from `/detect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub detections: Vec<DetectionDto>,
}

/// Response from `/embed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}

/// One face estimate as returned by `/faces`. The `age` field carries the
/// model's bracket label (for example `"(25-32)"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDto {
    pub age: AgeBracket,
    pub gender: Gender,
    pub confidence: f64,
}

/// Response from `/faces`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacesResponse {
    pub faces: Vec<FaceDto>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_dto_parses_model_labels() {
        let dto: FaceDto =
            serde_json::from_str(r#"{"age":"(25-32)","gender":"Female","confidence":0.87}"#)
                .unwrap();
        assert_eq!(dto.age, AgeBracket::Age25To32);
        assert_eq!(dto.gender, Gender::Female);
    }
}
