//! The canonical identity registry.
//!
//! Tracker ids are transient: a shopper occluded for a few frames comes back
//! as a new track. The registry reconciles each track against every known
//! identity by cosine distance over appearance embeddings, so dwell and
//! demographic state survives track breaks. All per-shopper state is keyed
//! by canonical id; transient track ids never key anything.
//!
//! Reconciliation is scan-then-insert under one lock acquisition, so two
//! concurrent reconciles can never both insert an identity for the same
//! shopper.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use storesight_models::{
    cosine_distance, format_first_seen, round2, AgeBracket, CustomerRecord, Embedding,
    FaceObservation, Gender, ZoneLabel, ZoneVisitRecord,
};

use crate::demographics::DemographicAggregate;
use crate::dwell::DwellTracker;
use crate::error::{VisionError, VisionResult};

/// Default cosine-distance threshold for a re-identification match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// Stable identifier for one shopper, minted from the founding track's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalId(pub u32);

impl std::fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All state held for one canonical identity.
#[derive(Debug, Clone)]
struct Identity {
    id: CanonicalId,
    /// Most recent appearance embedding; replaced on every match
    embedding: Embedding,
    dwell: DwellTracker,
    demographics: DemographicAggregate,
}

impl Identity {
    fn new(id: CanonicalId, embedding: Embedding, now: DateTime<Utc>) -> Self {
        Self {
            id,
            embedding,
            dwell: DwellTracker::new(now),
            demographics: DemographicAggregate::new(),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    identities: Vec<Identity>,
    /// Identities observed in the previous processed frame
    seen_last_frame: HashSet<CanonicalId>,
}

/// Point-in-time view of one identity, used to build snapshot files.
#[derive(Debug, Clone)]
pub struct IdentitySummary {
    pub id: CanonicalId,
    pub first_seen: DateTime<Utc>,
    pub age: Option<AgeBracket>,
    pub gender: Option<Gender>,
    pub total_secs: f64,
    pub zone_secs: Vec<(ZoneLabel, f64)>,
}

/// Point-in-time view of the whole registry.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub identities: Vec<IdentitySummary>,
}

impl RegistrySnapshot {
    /// Customer rows for the daily snapshot file. Identities with no face
    /// samples yet are skipped; brackets and genders are the sample modes.
    pub fn customer_records(&self) -> Vec<CustomerRecord> {
        self.identities
            .iter()
            .filter_map(|identity| {
                let age = identity.age?;
                let gender = identity.gender?;
                Some(CustomerRecord {
                    age,
                    gender,
                    date_time: format_first_seen(&identity.first_seen.with_timezone(&Local)),
                    in_store_duration: round2(identity.total_secs),
                })
            })
            .collect()
    }

    /// Zone-visit rows for the daily snapshot file, one map per identity
    /// with every zone label present (unvisited zones read 0.0).
    pub fn zone_visit_records(&self) -> Vec<ZoneVisitRecord> {
        self.identities
            .iter()
            .map(|identity| {
                let mut record = ZoneVisitRecord::new();
                for label in ZoneLabel::all() {
                    record.set(label, 0.0);
                }
                for &(label, secs) in &identity.zone_secs {
                    record.set(label, round2(secs));
                }
                record
            })
            .collect()
    }
}

/// Registry of every shopper seen since startup.
///
/// Identities are never evicted; at store scale the linear scan over a
/// day's worth of entries stays cheap.
pub struct IdentityRegistry {
    threshold: f32,
    inner: Mutex<RegistryInner>,
}

impl IdentityRegistry {
    /// Create a registry with the given match threshold (strict upper bound
    /// on cosine distance).
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    fn lock(&self) -> VisionResult<std::sync::MutexGuard<'_, RegistryInner>> {
        self.inner
            .lock()
            .map_err(|_| VisionError::internal("identity registry lock poisoned"))
    }

    /// Resolve a track to its canonical identity.
    ///
    /// Scans every stored identity for the global minimum cosine distance;
    /// a strict `< threshold` minimum is a match and the stored embedding is
    /// replaced with the fresh one (appearance drifts with lighting and
    /// pose, so the most recent view matches the next frame best). Anything
    /// else mints a new identity. Matching an identity that was absent last
    /// frame re-stamps its dwell clock so the away-gap is never credited.
    pub fn reconcile(
        &self,
        track_id: u32,
        embedding: Embedding,
        now: DateTime<Utc>,
    ) -> VisionResult<CanonicalId> {
        let mut inner = self.lock()?;

        let mut best: Option<(usize, f32)> = None;
        for (idx, identity) in inner.identities.iter().enumerate() {
            let dist = cosine_distance(&identity.embedding, &embedding);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((idx, dist)),
            }
        }

        if let Some((idx, dist)) = best {
            if dist < self.threshold {
                let reacquired = !inner.seen_last_frame.contains(&inner.identities[idx].id);
                let identity = &mut inner.identities[idx];
                identity.embedding = embedding;
                if reacquired {
                    identity.dwell.reset_clock(now);
                }
                debug!(track_id, canonical_id = %identity.id, distance = dist, "track reconciled");
                return Ok(identity.id);
            }
        }

        // No identity close enough: mint one from the founding track id.
        // Track ids are never reused, but a track whose embedding drifts past
        // the threshold mid-life could try to found twice; fall back to the
        // next free id in that case.
        let taken = inner.identities.iter().any(|i| i.id.0 == track_id);
        let id = if taken {
            let max = inner.identities.iter().map(|i| i.id.0).max().unwrap_or(0);
            CanonicalId(max + 1)
        } else {
            CanonicalId(track_id)
        };
        debug!(track_id, canonical_id = %id, "new identity");
        inner.identities.push(Identity::new(id, embedding, now));
        Ok(id)
    }

    /// Record one frame's zone observation for an identity.
    pub fn observe_zone(
        &self,
        id: CanonicalId,
        now: DateTime<Utc>,
        zone: Option<ZoneLabel>,
    ) -> VisionResult<()> {
        let mut inner = self.lock()?;
        if let Some(identity) = inner.identities.iter_mut().find(|i| i.id == id) {
            identity.dwell.observe(now, zone);
        }
        Ok(())
    }

    /// Record one face observation for an identity.
    pub fn observe_face(&self, id: CanonicalId, obs: &FaceObservation) -> VisionResult<()> {
        let mut inner = self.lock()?;
        if let Some(identity) = inner.identities.iter_mut().find(|i| i.id == id) {
            identity.demographics.observe(obs);
        }
        Ok(())
    }

    /// Record which identities were present in the frame just processed.
    pub fn mark_frame_end(&self, seen: &[CanonicalId]) -> VisionResult<()> {
        let mut inner = self.lock()?;
        inner.seen_last_frame = seen.iter().copied().collect();
        Ok(())
    }

    /// Number of identities known since startup.
    pub fn len(&self) -> VisionResult<usize> {
        Ok(self.lock()?.identities.len())
    }

    pub fn is_empty(&self) -> VisionResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Clone out a point-in-time view for snapshot serialization.
    pub fn snapshot(&self) -> VisionResult<RegistrySnapshot> {
        let inner = self.lock()?;
        let identities = inner
            .identities
            .iter()
            .map(|identity| IdentitySummary {
                id: identity.id,
                first_seen: identity.dwell.first_seen(),
                age: identity.demographics.age_mode(),
                gender: identity.demographics.gender_mode(),
                total_secs: identity.dwell.total_secs(),
                zone_secs: identity
                    .dwell
                    .zone_totals()
                    .iter()
                    .map(|(&label, &secs)| (label, secs))
                    .collect(),
            })
            .collect();
        Ok(RegistrySnapshot { identities })
    }
}
