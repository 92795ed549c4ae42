//! Route table.

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::health_check;
use crate::metrics::track_metrics;
use crate::state::AppState;
use crate::ws::ws_stream;

/// Create the server router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check));

    let ws_routes = Router::new().route("/ws", get(ws_stream));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(health_routes)
        .merge(ws_routes)
        .merge(metrics_routes)
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
