//! StoreSight analytics server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storesight_inference::{HttpCamera, InferenceClient};
use storesight_models::ZoneLayout;
use storesight_storage::{S3Client, SnapshotStore};
use storesight_sync::{SyncConfig, SyncService};
use storesight_vision::{
    BasicAnnotator, FramePipeline, IdentityRegistry, IouTracker, PipelineConfig,
};

use storesight_server::{create_router, metrics, AppState, PipelineTask, ServerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("storesight=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting storesight-server");

    // Load configuration
    let config = ServerConfig::from_env();
    info!("Server config: host={}, port={}", config.host, config.port);

    // The spool is useless if S3 never drains it, so fail fast here.
    let s3 = match S3Client::from_env().await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create S3 client: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = s3.check_bucket().await {
        error!("S3 bucket check failed: {}", e);
        std::process::exit(1);
    }
    info!("S3 bucket {} is reachable", s3.bucket());

    let store = SnapshotStore::new(config.snapshot_root.clone());

    // Zone layout: per-store file if configured, built-in storefront otherwise
    let layout = match config.zone_layout_path {
        Some(ref path) => match ZoneLayout::from_file(path) {
            Ok(layout) => {
                info!("Loaded zone layout from {}", path.display());
                layout
            }
            Err(e) => {
                error!("Failed to load zone layout from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ZoneLayout::storefront(),
    };

    // Inference sidecar client
    let inference = match InferenceClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create inference client: {}", e);
            std::process::exit(1);
        }
    };
    match inference.health_check().await {
        Ok(true) => info!("Inference sidecar is healthy"),
        Ok(false) => warn!("Inference sidecar reports unhealthy, continuing"),
        Err(e) => warn!("Inference sidecar unreachable, continuing: {}", e),
    }

    // Camera frame source
    let camera = match HttpCamera::from_env() {
        Ok(camera) => camera,
        Err(e) => {
            error!("Failed to create camera source: {}", e);
            std::process::exit(1);
        }
    };

    // Wire the pipeline
    let registry = Arc::new(IdentityRegistry::new(config.similarity_threshold));
    let pipeline = FramePipeline::new(
        Box::new(camera),
        Box::new(inference.clone()),
        Box::new(IouTracker::new()),
        Box::new(inference.clone()),
        Box::new(inference),
        Box::new(BasicAnnotator::new()),
        Arc::clone(&registry),
        layout,
        PipelineConfig {
            detection_confidence: config.detection_confidence,
            jpeg_quality: config.jpeg_quality,
        },
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics())
    } else {
        None
    };

    // Background tasks and open stream sockets share one shutdown flag
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let state = AppState::new(config.clone(), shutdown_rx.clone());

    // Start the frame loop
    let pipeline_task = PipelineTask::new(
        pipeline,
        store.clone(),
        state.frames.clone(),
        config.frame_interval_ms,
    );
    let pipeline_handle = tokio::spawn(pipeline_task.run(shutdown_rx.clone()));

    // Start the snapshot sync
    let sync_handle = if config.sync_enabled {
        let sync = SyncService::new(SyncConfig::from_env(), store, s3);
        Some(tokio::spawn(sync.run(shutdown_rx)))
    } else {
        info!("Snapshot sync disabled");
        None
    };

    // Create router
    let app = create_router(state, metrics_handle);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Stops the frame loop and sync loop and closes stream viewers,
            // which lets the connection drain finish.
            let _ = shutdown_tx.send(true);
        })
        .await
        .unwrap();

    // Wait for background tasks
    let _ = tokio::time::timeout(Duration::from_secs(10), pipeline_handle).await;
    if let Some(handle) = sync_handle {
        let _ = tokio::time::timeout(Duration::from_secs(10), handle).await;
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
