//! Greedy IoU person tracker.
//!
//! Matches detections to live tracks by best IoU, confirms tracks after a
//! minimum number of hits so single-frame noise never reaches the identity
//! registry, and retires tracks after consecutive misses. At store camera
//! frame rates people move a small fraction of their box per frame, so IoU
//! association is enough and no motion model is kept.
//!
//! Track ids are monotonically increasing and never reused.

use tracing::debug;

use storesight_models::BoundingBox;

use crate::providers::{Detection, PersonTracker, TrackedPerson};

/// Configuration for tracker behavior.
#[derive(Debug, Clone)]
pub struct IouTrackerConfig {
    /// IoU threshold for matching detections to tracks
    pub iou_threshold: f64,
    /// Consecutive missed frames before a track is deleted
    pub max_misses: u32,
    /// Hits before a track is considered confirmed
    pub min_hits: u32,
}

impl Default for IouTrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_misses: 5,
            min_hits: 2,
        }
    }
}

/// Individual person track.
#[derive(Debug, Clone)]
pub struct PersonTrack {
    /// Unique track identifier
    pub track_id: u32,
    /// Last matched bounding box
    pub bbox: BoundingBox,
    /// Number of successful updates
    pub hits: u32,
    /// Frames since last detection match
    pub time_since_update: u32,
    /// Whether track has enough hits to be reported
    pub confirmed: bool,
}

impl PersonTrack {
    fn new(track_id: u32, bbox: BoundingBox, config: &IouTrackerConfig) -> Self {
        Self {
            track_id,
            bbox,
            hits: 1,
            time_since_update: 0,
            confirmed: config.min_hits <= 1,
        }
    }

    fn update(&mut self, bbox: BoundingBox, config: &IouTrackerConfig) {
        self.bbox = bbox;
        self.hits += 1;
        self.time_since_update = 0;
        if self.hits >= config.min_hits {
            self.confirmed = true;
        }
    }

    fn should_delete(&self, config: &IouTrackerConfig) -> bool {
        self.time_since_update > config.max_misses
    }
}

/// Multi-object greedy IoU tracker.
pub struct IouTracker {
    config: IouTrackerConfig,
    tracks: Vec<PersonTrack>,
    next_track_id: u32,
    total_tracks_created: u64,
}

impl IouTracker {
    /// Create a new tracker with default configuration.
    pub fn new() -> Self {
        Self::with_config(IouTrackerConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: IouTrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_track_id: 0,
            total_tracks_created: 0,
        }
    }

    /// Get number of live tracks (confirmed or not).
    pub fn active_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get total tracks ever created.
    pub fn total_tracks_created(&self) -> u64 {
        self.total_tracks_created
    }

    fn advance(&mut self, detections: &[Detection]) -> Vec<TrackedPerson> {
        // Age every track; matches below reset the counter
        for track in &mut self.tracks {
            track.time_since_update += 1;
        }

        let (matches, unmatched_dets) = self.match_detections(detections);

        for (track_idx, det_idx) in matches {
            self.tracks[track_idx].update(detections[det_idx].bbox, &self.config);
        }

        for det_idx in unmatched_dets {
            let track = PersonTrack::new(self.next_track_id, detections[det_idx].bbox, &self.config);
            debug!(track_id = track.track_id, "new track");
            self.tracks.push(track);
            self.next_track_id += 1;
            self.total_tracks_created += 1;
        }

        let config = &self.config;
        self.tracks.retain(|t| {
            if t.should_delete(config) {
                debug!(track_id = t.track_id, hits = t.hits, "track retired");
                false
            } else {
                true
            }
        });

        self.tracks
            .iter()
            .filter(|t| t.confirmed && t.time_since_update == 0)
            .map(|t| TrackedPerson {
                track_id: t.track_id,
                bbox: t.bbox,
            })
            .collect()
    }

    /// Match detections to tracks greedily by descending IoU.
    fn match_detections(&self, detections: &[Detection]) -> (Vec<(usize, usize)>, Vec<usize>) {
        if self.tracks.is_empty() || detections.is_empty() {
            return (Vec::new(), (0..detections.len()).collect());
        }

        let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
        for (i, track) in self.tracks.iter().enumerate() {
            for (j, det) in detections.iter().enumerate() {
                let iou = track.bbox.iou(&det.bbox);
                if iou >= self.config.iou_threshold {
                    candidates.push((i, j, iou));
                }
            }
        }
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut matches = Vec::new();
        let mut matched_tracks = vec![false; self.tracks.len()];
        let mut matched_dets = vec![false; detections.len()];

        for (track_idx, det_idx, _iou) in candidates {
            if !matched_tracks[track_idx] && !matched_dets[det_idx] {
                matches.push((track_idx, det_idx));
                matched_tracks[track_idx] = true;
                matched_dets[det_idx] = true;
            }
        }

        let unmatched_dets: Vec<usize> = (0..detections.len())
            .filter(|&i| !matched_dets[i])
            .collect();

        (matches, unmatched_dets)
    }
}

impl Default for IouTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonTracker for IouTracker {
    fn update(&mut self, detections: &[Detection]) -> Vec<TrackedPerson> {
        self.advance(detections)
    }

    fn name(&self) -> &'static str {
        "greedy_iou"
    }
}
