//! Prometheus metrics for the analytics server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics recorder and return a handle for rendering.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "storesight_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "storesight_http_request_duration_seconds";

    // Pipeline metrics
    pub const FRAMES_PROCESSED_TOTAL: &str = "storesight_frames_processed_total";
    pub const FRAME_FAILURES_TOTAL: &str = "storesight_frame_failures_total";
    pub const FRAME_DURATION_SECONDS: &str = "storesight_frame_duration_seconds";
    pub const TRACKS_ACTIVE: &str = "storesight_tracks_active";
    pub const IDENTITIES_KNOWN: &str = "storesight_identities_known";

    // Stream metrics
    pub const VIEWERS_TOTAL: &str = "storesight_viewers_total";
    pub const VIEWERS_ACTIVE: &str = "storesight_viewers_active";
    pub const FRAMES_STREAMED_TOTAL: &str = "storesight_frames_streamed_total";

    // Snapshot metrics
    pub const SNAPSHOT_WRITES_TOTAL: &str = "storesight_snapshot_writes_total";
    pub const SNAPSHOT_WRITE_FAILURES_TOTAL: &str = "storesight_snapshot_write_failures_total";
}

/// Record an HTTP request with its outcome.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one successfully processed frame.
pub fn record_frame_processed(duration_secs: f64) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FRAME_DURATION_SECONDS).record(duration_secs);
}

/// Record a failed frame.
pub fn record_frame_failure() {
    counter!(names::FRAME_FAILURES_TOTAL).increment(1);
}

/// Update the confirmed-track gauge.
pub fn set_active_tracks(count: usize) {
    gauge!(names::TRACKS_ACTIVE).set(count as f64);
}

/// Update the known-identity gauge.
pub fn set_known_identities(count: usize) {
    gauge!(names::IDENTITIES_KNOWN).set(count as f64);
}

/// Record a new stream viewer connection.
pub fn record_viewer_connection() {
    counter!(names::VIEWERS_TOTAL).increment(1);
}

/// Update the active viewer gauge.
pub fn set_active_viewers(count: i64) {
    gauge!(names::VIEWERS_ACTIVE).set(count as f64);
}

/// Record one frame sent to one viewer.
pub fn record_frame_streamed() {
    counter!(names::FRAMES_STREAMED_TOTAL).increment(1);
}

/// Record a snapshot file write.
pub fn record_snapshot_write(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::SNAPSHOT_WRITES_TOTAL, &labels).increment(1);
}

/// Record a failed snapshot file write.
pub fn record_snapshot_write_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::SNAPSHOT_WRITE_FAILURES_TOTAL, &labels).increment(1);
}

/// Axum middleware that records request metrics.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response<Body> {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
