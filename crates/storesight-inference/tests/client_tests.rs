//! Inference client integration tests against a mock sidecar.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storesight_inference::{CameraConfig, HttpCamera, InferenceClient, InferenceConfig, InferenceError};
use storesight_models::{AgeBracket, Gender};
use storesight_vision::{encode_jpeg, Frame, FrameSource};

fn test_client(base_url: String) -> InferenceClient {
    InferenceClient::new(InferenceConfig {
        base_url,
        timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        max_retries: 1,
    })
    .unwrap()
}

fn test_frame() -> Frame {
    Frame::filled(32, 32, [50, 60, 70])
}

#[tokio::test]
async fn test_detect_parses_detections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "detections": [
                {"x": 100.0, "y": 50.0, "width": 60.0, "height": 160.0, "confidence": 0.92},
                {"x": 400.0, "y": 40.0, "width": 55.0, "height": 150.0, "confidence": 0.81}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let detections = client.detect(&test_frame()).await.unwrap();

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].bbox.x, 100.0);
    assert_eq!(detections[0].confidence, 0.92);
}

#[tokio::test]
async fn test_request_carries_base64_image() {
    let server = MockServer::start().await;
    let frame = test_frame();
    let jpeg = encode_jpeg(&frame, 90).unwrap();
    let expected = {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.encode(jpeg)
    };

    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(body_partial_json(json!({ "image": expected })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "detections": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let detections = client.detect(&frame).await.unwrap();
    assert!(detections.is_empty());
}

#[tokio::test]
async fn test_embed_parses_embedding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": [0.1, 0.2, 0.3, 0.4]
        })))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let embedding = client.embed(&test_frame()).await.unwrap();
    assert_eq!(embedding.len(), 4);
}

#[tokio::test]
async fn test_empty_embedding_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [] })))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let err = client.embed(&test_frame()).await.unwrap_err();
    assert!(matches!(err, InferenceError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_faces_parses_model_labels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "faces": [
                {"age": "(38-43)", "gender": "Male", "confidence": 0.77}
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let faces = client.faces(&test_frame()).await.unwrap();

    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].age, AgeBracket::Age38To43);
    assert_eq!(faces[0].gender, Gender::Male);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    // First attempt gets a 503, the retry succeeds
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [1.0] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let embedding = client.embed(&test_frame()).await.unwrap();
    assert_eq!(embedding.len(), 1);
}

#[tokio::test]
async fn test_client_error_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/faces"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad image"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let err = client.faces(&test_frame()).await.unwrap_err();
    assert!(matches!(err, InferenceError::RequestFailed(_)));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "version": "1.2.0" })),
        )
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_unreachable_is_false() {
    let client = test_client("http://127.0.0.1:1".to_string());
    assert!(!client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_camera_fetches_and_decodes() {
    let server = MockServer::start().await;
    let jpeg = encode_jpeg(&Frame::filled(80, 60, [10, 20, 30]), 90).unwrap();
    Mock::given(method("GET"))
        .and(path("/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg))
        .mount(&server)
        .await;

    let camera = HttpCamera::new(CameraConfig {
        url: format!("{}/snapshot", server.uri()),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let frame = camera.next_frame().await.unwrap();
    assert_eq!(frame.width, 80);
    assert_eq!(frame.height, 60);
}

#[tokio::test]
async fn test_camera_error_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/snapshot"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let camera = HttpCamera::new(CameraConfig {
        url: format!("{}/snapshot", server.uri()),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    assert!(camera.next_frame().await.is_err());
}
