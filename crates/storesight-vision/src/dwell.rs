//! Per-identity dwell time integration.
//!
//! Dwell is integrated by re-stamping: every observation credits the time
//! since the previous stamp to the zone the person was in, then stamps the
//! new zone and timestamp. Nothing is flushed when a track is lost, so the
//! open interval between the last stamp and the disappearance is dropped.
//! The registry re-stamps the clock on re-acquisition so the away-gap is
//! never credited either.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use storesight_models::ZoneLabel;

/// Dwell accumulation state for one canonical identity.
///
/// Accumulators are kept un-rounded; rounding to 2 decimals happens at
/// snapshot serialization.
#[derive(Debug, Clone)]
pub struct DwellTracker {
    current_zone: Option<ZoneLabel>,
    entered_at: DateTime<Utc>,
    per_zone: BTreeMap<ZoneLabel, f64>,
    total_secs: f64,
    first_seen: DateTime<Utc>,
}

impl DwellTracker {
    /// Start tracking at `now`, outside every zone.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_zone: None,
            entered_at: now,
            per_zone: BTreeMap::new(),
            total_secs: 0.0,
            first_seen: now,
        }
    }

    /// Record one frame's zone observation.
    ///
    /// The interval since the previous stamp is credited to the zone being
    /// left (or re-confirmed) and to the total; time spent outside every
    /// zone counts toward neither.
    pub fn observe(&mut self, now: DateTime<Utc>, zone_now: Option<ZoneLabel>) {
        if let Some(zone) = self.current_zone {
            let delta = (now - self.entered_at)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            *self.per_zone.entry(zone).or_insert(0.0) += delta;
            self.total_secs += delta;
        }
        self.entered_at = now;
        self.current_zone = zone_now;
    }

    /// Re-stamp the clock without crediting the open interval.
    ///
    /// Called when an identity is re-acquired after absence: the stale
    /// stamp would otherwise credit the whole away-gap to the zone the
    /// person was last seen in.
    pub fn reset_clock(&mut self, now: DateTime<Utc>) {
        self.entered_at = now;
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn current_zone(&self) -> Option<ZoneLabel> {
        self.current_zone
    }

    /// Total accumulated in-store seconds.
    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    /// Accumulated seconds for one zone.
    pub fn zone_secs(&self, zone: ZoneLabel) -> f64 {
        self.per_zone.get(&zone).copied().unwrap_or(0.0)
    }

    /// Accumulated seconds per zone.
    pub fn zone_totals(&self) -> &BTreeMap<ZoneLabel, f64> {
        &self.per_zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    #[test]
    fn test_zone_transition_credits_zone_being_left() {
        let mut dwell = DwellTracker::new(t0());
        dwell.observe(at(0), Some(ZoneLabel::A));
        dwell.observe(at(5), Some(ZoneLabel::A));
        dwell.observe(at(5), Some(ZoneLabel::B));
        dwell.observe(at(12), Some(ZoneLabel::B));

        assert_eq!(dwell.zone_secs(ZoneLabel::A), 5.0);
        assert_eq!(dwell.zone_secs(ZoneLabel::B), 7.0);
        assert_eq!(dwell.total_secs(), 12.0);
    }

    #[test]
    fn test_open_interval_dropped_on_loss() {
        let mut dwell = DwellTracker::new(t0());
        dwell.observe(at(0), Some(ZoneLabel::A));
        // Track lost here: no further observations, nothing flushed
        assert_eq!(dwell.zone_secs(ZoneLabel::A), 0.0);
        assert_eq!(dwell.total_secs(), 0.0);
    }

    #[test]
    fn test_out_of_zone_time_counts_nowhere() {
        let mut dwell = DwellTracker::new(t0());
        dwell.observe(at(0), Some(ZoneLabel::A));
        dwell.observe(at(4), None);
        dwell.observe(at(10), Some(ZoneLabel::C));
        dwell.observe(at(13), Some(ZoneLabel::C));

        assert_eq!(dwell.zone_secs(ZoneLabel::A), 4.0);
        assert_eq!(dwell.zone_secs(ZoneLabel::C), 3.0);
        // The 6 seconds outside every zone are not in the total
        assert_eq!(dwell.total_secs(), 7.0);
    }

    #[test]
    fn test_reset_clock_drops_away_gap() {
        let mut dwell = DwellTracker::new(t0());
        dwell.observe(at(0), Some(ZoneLabel::A));
        dwell.observe(at(3), Some(ZoneLabel::A));

        // Absent for 60 seconds, then re-acquired
        dwell.reset_clock(at(63));
        dwell.observe(at(63), Some(ZoneLabel::B));
        dwell.observe(at(66), Some(ZoneLabel::B));

        assert_eq!(dwell.zone_secs(ZoneLabel::A), 3.0);
        assert_eq!(dwell.zone_secs(ZoneLabel::B), 3.0);
        assert_eq!(dwell.total_secs(), 6.0);
    }

    #[test]
    fn test_backwards_clock_credits_nothing() {
        let mut dwell = DwellTracker::new(at(10));
        dwell.observe(at(10), Some(ZoneLabel::A));
        dwell.observe(at(5), Some(ZoneLabel::A));
        assert_eq!(dwell.zone_secs(ZoneLabel::A), 0.0);

        // Accumulation resumes from the earlier stamp
        dwell.observe(at(8), Some(ZoneLabel::A));
        assert_eq!(dwell.zone_secs(ZoneLabel::A), 3.0);
    }

    #[test]
    fn test_first_seen_is_stable() {
        let mut dwell = DwellTracker::new(t0());
        dwell.observe(at(5), Some(ZoneLabel::D));
        dwell.observe(at(9), None);
        assert_eq!(dwell.first_seen(), t0());
    }

    #[test]
    fn test_fractional_seconds() {
        let mut dwell = DwellTracker::new(t0());
        dwell.observe(t0(), Some(ZoneLabel::E));
        dwell.observe(t0() + Duration::milliseconds(1500), Some(ZoneLabel::E));
        assert!((dwell.zone_secs(ZoneLabel::E) - 1.5).abs() < 1e-9);
    }
}
