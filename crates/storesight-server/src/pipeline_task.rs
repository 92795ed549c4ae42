//! The frame loop.
//!
//! Owns the vision pipeline and drives it on a fixed cadence: process a
//! frame, broadcast the annotated JPEG to stream viewers, and spool the
//! registry snapshot into the per-day files the sync service ships.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use storesight_models::day_key;
use storesight_storage::SnapshotStore;
use storesight_sync::FailureStreak;
use storesight_vision::{FramePipeline, FrameReport};

use crate::metrics;

/// Drives one camera's pipeline until shutdown.
pub struct PipelineTask {
    pipeline: FramePipeline,
    store: SnapshotStore,
    frames: broadcast::Sender<String>,
    interval: Duration,
}

impl PipelineTask {
    pub fn new(
        pipeline: FramePipeline,
        store: SnapshotStore,
        frames: broadcast::Sender<String>,
        frame_interval_ms: u64,
    ) -> Self {
        Self {
            pipeline,
            store,
            frames,
            interval: Duration::from_millis(frame_interval_ms),
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Pipeline task started, one frame per {:?}", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        // A slow frame delays the next tick rather than causing a burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut streak = FailureStreak::default();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, stopping pipeline task");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let start = Instant::now();
                    match self.pipeline.process_next().await {
                        Ok(report) => {
                            if let Some(failures) = streak.record_success() {
                                info!("Frame processing recovered after {} failures", failures);
                            }
                            metrics::record_frame_processed(start.elapsed().as_secs_f64());
                            self.publish(report).await;
                        }
                        Err(e) => {
                            metrics::record_frame_failure();
                            if streak.record_failure() {
                                error!("Frame processing failed: {}", e);
                            } else {
                                debug!(
                                    "Frame processing failed again ({} consecutive): {}",
                                    streak.count(),
                                    e
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    /// Fan the annotated frame out to viewers and spool the snapshot.
    async fn publish(&self, report: FrameReport) {
        metrics::set_active_tracks(report.tracked.len());
        metrics::set_known_identities(report.snapshot.identities.len());

        let encoded = STANDARD.encode(&report.annotated_jpeg);
        // Send fails only when nobody is watching.
        let _ = self.frames.send(encoded);

        let day = day_key(&report.stamp.with_timezone(&Local));

        let customers = report.snapshot.customer_records();
        match self.store.write_customer(&day, &customers).await {
            Ok(_) => metrics::record_snapshot_write("customer"),
            Err(e) => {
                metrics::record_snapshot_write_failure("customer");
                warn!("Customer snapshot write failed: {}", e);
            }
        }

        let visits = report.snapshot.zone_visit_records();
        match self.store.write_zone_visits(&day, &visits).await {
            Ok(_) => metrics::record_snapshot_write("visit_zone"),
            Err(e) => {
                metrics::record_snapshot_write_failure("visit_zone");
                warn!("Zone-visit snapshot write failed: {}", e);
            }
        }
    }
}
