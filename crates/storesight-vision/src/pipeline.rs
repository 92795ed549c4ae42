//! Per-frame orchestration.
//!
//! One `FramePipeline` owns the collaborators for one camera and drives a
//! frame end to end: acquire, detect, track, reconcile identities, locate
//! zones, sample faces, snapshot the registry, annotate and JPEG-encode.
//! Per-track collaborator failures degrade that track for that frame only;
//! the frame as a whole still completes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use storesight_models::ZoneLayout;

use crate::annotate::FrameAnnotator;
use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;
use crate::providers::{
    AppearanceEmbedder, Detection, FaceEstimator, FrameSource, PersonDetector, PersonTracker,
    TrackedPerson,
};
use crate::registry::{CanonicalId, IdentityRegistry, RegistrySnapshot};

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Detections below this confidence are discarded before tracking
    pub detection_confidence: f64,
    /// JPEG quality for the annotated stream (1-100)
    pub jpeg_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_confidence: 0.5,
            jpeg_quality: 80,
        }
    }
}

/// What one processed frame produced.
pub struct FrameReport {
    /// The single timestamp every consumer of this frame saw
    pub stamp: DateTime<Utc>,
    /// Detections that survived the confidence filter
    pub detections: usize,
    /// Confirmed tracks this frame
    pub tracked: Vec<TrackedPerson>,
    /// Canonical identities observed this frame
    pub identities_seen: Vec<CanonicalId>,
    /// Point-in-time registry view for snapshot files
    pub snapshot: RegistrySnapshot,
    /// Annotated frame, JPEG-encoded for streaming
    pub annotated_jpeg: Vec<u8>,
}

/// End-to-end processing for one camera.
pub struct FramePipeline {
    source: Box<dyn FrameSource>,
    detector: Box<dyn PersonDetector>,
    tracker: Box<dyn PersonTracker>,
    embedder: Box<dyn AppearanceEmbedder>,
    estimator: Box<dyn FaceEstimator>,
    annotator: Box<dyn FrameAnnotator>,
    registry: Arc<IdentityRegistry>,
    layout: ZoneLayout,
    config: PipelineConfig,
}

impl FramePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn PersonDetector>,
        tracker: Box<dyn PersonTracker>,
        embedder: Box<dyn AppearanceEmbedder>,
        estimator: Box<dyn FaceEstimator>,
        annotator: Box<dyn FrameAnnotator>,
        registry: Arc<IdentityRegistry>,
        layout: ZoneLayout,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            detector,
            tracker,
            embedder,
            estimator,
            annotator,
            registry,
            layout,
            config,
        }
    }

    /// The registry backing this pipeline.
    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    /// Acquire and process the next frame.
    pub async fn process_next(&mut self) -> VisionResult<FrameReport> {
        let frame = self.source.next_frame().await?;
        // One stamp per frame; dwell deltas and snapshot times all use it
        let now = Utc::now();

        let detections: Vec<Detection> = self
            .detector
            .detect(&frame)
            .await?
            .into_iter()
            .filter(|d| d.confidence >= self.config.detection_confidence)
            .collect();

        let tracks = self.tracker.update(&detections);

        let mut seen = Vec::with_capacity(tracks.len());
        for track in &tracks {
            match self.observe_track(&frame, track, now).await {
                Ok(id) => seen.push(id),
                Err(error) => {
                    warn!(track_id = track.track_id, %error, "identity update skipped this frame");
                }
            }
        }
        self.registry.mark_frame_end(&seen)?;

        let snapshot = self.registry.snapshot()?;
        let annotated = self.annotator.annotate(&frame, &self.layout, &tracks)?;
        let annotated_jpeg = encode_jpeg(&annotated, self.config.jpeg_quality)?;

        debug!(
            detections = detections.len(),
            tracked = tracks.len(),
            identities = snapshot.identities.len(),
            "frame processed"
        );

        Ok(FrameReport {
            stamp: now,
            detections: detections.len(),
            tracked: tracks,
            identities_seen: seen,
            snapshot,
            annotated_jpeg,
        })
    }

    /// Reconcile one track and feed its zone and face observations.
    async fn observe_track(
        &self,
        frame: &Frame,
        track: &TrackedPerson,
        now: DateTime<Utc>,
    ) -> VisionResult<CanonicalId> {
        let crop = frame.crop(&track.bbox)?;
        let embedding = self.embedder.embed(&crop).await?;
        let id = self.registry.reconcile(track.track_id, embedding, now)?;

        let (cx, cy) = track.bbox.center();
        let zone = self.layout.locate(cx, cy);
        self.registry.observe_zone(id, now, zone)?;

        // A failed face read costs one sample, not the track
        match self.estimator.estimate(&crop).await {
            Ok(faces) => {
                if let Some(face) = faces.first() {
                    self.registry.observe_face(id, face)?;
                }
            }
            Err(error) => {
                debug!(track_id = track.track_id, %error, "no face sample this frame");
            }
        }

        Ok(id)
    }
}

/// JPEG-encode an RGB frame for the stream.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> VisionResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(&frame.data, frame.width, frame.height, image::ColorType::Rgb8)
        .map_err(|e| VisionError::encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use storesight_models::{AgeBracket, BoundingBox, Embedding, FaceObservation, Gender, ZoneLabel};

    use crate::annotate::BasicAnnotator;
    use crate::tracker::{IouTracker, IouTrackerConfig};

    struct FixedSource {
        frame: Frame,
    }

    #[async_trait]
    impl FrameSource for FixedSource {
        async fn next_frame(&self) -> VisionResult<Frame> {
            Ok(self.frame.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Pops one pre-programmed detection set per frame.
    struct ScriptedDetector {
        script: Mutex<Vec<Vec<Detection>>>,
    }

    impl ScriptedDetector {
        fn new(mut frames: Vec<Vec<Detection>>) -> Self {
            frames.reverse();
            Self {
                script: Mutex::new(frames),
            }
        }
    }

    #[async_trait]
    impl PersonDetector for ScriptedDetector {
        async fn detect(&self, _frame: &Frame) -> VisionResult<Vec<Detection>> {
            Ok(self.script.lock().unwrap().pop().unwrap_or_default())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Derives a deterministic embedding from the crop's top-left pixel, so
    /// people standing in different places get distinct appearances.
    struct PixelEmbedder;

    #[async_trait]
    impl AppearanceEmbedder for PixelEmbedder {
        async fn embed(&self, crop: &Frame) -> VisionResult<Embedding> {
            let r = crop.data[0] as f32 + 1.0;
            Ok(Embedding::new(vec![r, 1.0]))
        }

        fn name(&self) -> &'static str {
            "pixel"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl AppearanceEmbedder for FailingEmbedder {
        async fn embed(&self, _crop: &Frame) -> VisionResult<Embedding> {
            Err(VisionError::embedding("model offline"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct FixedFaces {
        faces: Vec<FaceObservation>,
    }

    #[async_trait]
    impl FaceEstimator for FixedFaces {
        async fn estimate(&self, _crop: &Frame) -> VisionResult<Vec<FaceObservation>> {
            Ok(self.faces.clone())
        }

        fn name(&self) -> &'static str {
            "fixed_faces"
        }
    }

    fn person_at(x: f64, confidence: f64) -> Detection {
        Detection::new(BoundingBox::new(x, 100.0, 60.0, 160.0), confidence)
    }

    fn pipeline_with(
        detector: ScriptedDetector,
        embedder: Box<dyn AppearanceEmbedder>,
        faces: Vec<FaceObservation>,
    ) -> FramePipeline {
        FramePipeline::new(
            Box::new(FixedSource {
                frame: Frame::filled(1280, 960, [40, 40, 40]),
            }),
            Box::new(detector),
            Box::new(IouTracker::with_config(IouTrackerConfig {
                min_hits: 1,
                ..Default::default()
            })),
            embedder,
            Box::new(FixedFaces { faces }),
            Box::new(BasicAnnotator::new()),
            Arc::new(IdentityRegistry::new(0.3)),
            ZoneLayout::storefront(),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_person_in_zone_creates_identity() {
        let detector = ScriptedDetector::new(vec![
            vec![person_at(70.0, 0.9)], // center x = 100 -> zone A
            vec![person_at(72.0, 0.9)],
        ]);
        let mut pipeline = pipeline_with(detector, Box::new(PixelEmbedder), vec![]);

        pipeline.process_next().await.unwrap();
        let report = pipeline.process_next().await.unwrap();

        assert_eq!(report.tracked.len(), 1);
        assert_eq!(report.identities_seen.len(), 1);
        assert_eq!(report.snapshot.identities.len(), 1);
        let summary = &report.snapshot.identities[0];
        assert!(summary.zone_secs.iter().any(|(z, _)| *z == ZoneLabel::A));
    }

    #[tokio::test]
    async fn test_low_confidence_detection_filtered() {
        let detector = ScriptedDetector::new(vec![vec![person_at(70.0, 0.2)]]);
        let mut pipeline = pipeline_with(detector, Box::new(PixelEmbedder), vec![]);

        let report = pipeline.process_next().await.unwrap();
        assert_eq!(report.detections, 0);
        assert!(report.tracked.is_empty());
        assert!(report.snapshot.identities.is_empty());
    }

    #[tokio::test]
    async fn test_embedder_failure_degrades_track_only() {
        let detector = ScriptedDetector::new(vec![vec![person_at(70.0, 0.9)]]);
        let mut pipeline = pipeline_with(detector, Box::new(FailingEmbedder), vec![]);

        let report = pipeline.process_next().await.unwrap();
        // Frame completed, but the track contributed no identity
        assert_eq!(report.tracked.len(), 1);
        assert!(report.identities_seen.is_empty());
        assert!(report.snapshot.identities.is_empty());
        assert!(!report.annotated_jpeg.is_empty());
    }

    #[tokio::test]
    async fn test_only_first_face_sampled() {
        let faces = vec![
            FaceObservation::new(AgeBracket::Age25To32, Gender::Male, 0.9),
            FaceObservation::new(AgeBracket::Age60To100, Gender::Female, 0.8),
        ];
        let detector = ScriptedDetector::new(vec![vec![person_at(70.0, 0.9)]]);
        let mut pipeline = pipeline_with(detector, Box::new(PixelEmbedder), faces);

        let report = pipeline.process_next().await.unwrap();
        let customers = report.snapshot.customer_records();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].age, AgeBracket::Age25To32);
        assert_eq!(customers[0].gender, Gender::Male);
    }

    #[tokio::test]
    async fn test_annotated_jpeg_is_valid() {
        let detector = ScriptedDetector::new(vec![vec![person_at(70.0, 0.9)]]);
        let mut pipeline = pipeline_with(detector, Box::new(PixelEmbedder), vec![]);

        let report = pipeline.process_next().await.unwrap();
        // JPEG start-of-image marker
        assert_eq!(&report.annotated_jpeg[..2], &[0xFF, 0xD8]);
    }
}
