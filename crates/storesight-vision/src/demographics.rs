//! Bounded demographic sampling and mode estimation.

use std::collections::VecDeque;

use storesight_models::{AgeBracket, FaceObservation, Gender};

/// Samples kept per attribute; the oldest is evicted when full.
pub const MAX_SAMPLES: usize = 10;

/// Bounded age/gender sample buffers for one canonical identity.
///
/// Individual face reads are noisy; the reported value is the mode over the
/// most recent samples. Ties resolve to the value that entered the buffer
/// earliest.
#[derive(Debug, Clone, Default)]
pub struct DemographicAggregate {
    ages: VecDeque<AgeBracket>,
    genders: VecDeque<Gender>,
}

impl DemographicAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one face observation to both sample buffers.
    pub fn observe(&mut self, obs: &FaceObservation) {
        if self.ages.len() == MAX_SAMPLES {
            self.ages.pop_front();
        }
        self.ages.push_back(obs.age);

        if self.genders.len() == MAX_SAMPLES {
            self.genders.pop_front();
        }
        self.genders.push_back(obs.gender);
    }

    /// Number of samples currently held.
    pub fn sample_count(&self) -> usize {
        self.ages.len()
    }

    /// Whether any face has been observed.
    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    /// Mode of the age samples, `None` when no face was ever observed.
    pub fn age_mode(&self) -> Option<AgeBracket> {
        mode(&self.ages)
    }

    /// Mode of the gender samples, `None` when no face was ever observed.
    pub fn gender_mode(&self) -> Option<Gender> {
        mode(&self.genders)
    }
}

/// Mode with earliest-insertion tie-break. Buffers hold at most
/// [`MAX_SAMPLES`] entries, so the quadratic scan is irrelevant.
fn mode<T: Copy + PartialEq>(samples: &VecDeque<T>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (i, &candidate) in samples.iter().enumerate() {
        if samples.iter().take(i).any(|&earlier| earlier == candidate) {
            continue; // already counted at its first occurrence
        }
        let count = samples.iter().filter(|&&s| s == candidate).count();
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((candidate, count)),
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(age: AgeBracket, gender: Gender) -> FaceObservation {
        FaceObservation::new(age, gender, 0.9)
    }

    #[test]
    fn test_empty_aggregate_has_no_mode() {
        let agg = DemographicAggregate::new();
        assert!(agg.age_mode().is_none());
        assert!(agg.gender_mode().is_none());
    }

    #[test]
    fn test_gender_mode_majority() {
        let mut agg = DemographicAggregate::new();
        agg.observe(&obs(AgeBracket::Age25To32, Gender::Male));
        agg.observe(&obs(AgeBracket::Age25To32, Gender::Female));
        agg.observe(&obs(AgeBracket::Age25To32, Gender::Male));
        assert_eq!(agg.gender_mode(), Some(Gender::Male));
    }

    #[test]
    fn test_tie_resolves_to_earliest_inserted() {
        let mut agg = DemographicAggregate::new();
        agg.observe(&obs(AgeBracket::Age38To43, Gender::Female));
        agg.observe(&obs(AgeBracket::Age25To32, Gender::Male));
        assert_eq!(agg.age_mode(), Some(AgeBracket::Age38To43));
        assert_eq!(agg.gender_mode(), Some(Gender::Female));
    }

    #[test]
    fn test_buffer_never_exceeds_capacity() {
        let mut agg = DemographicAggregate::new();
        for _ in 0..50 {
            agg.observe(&obs(AgeBracket::Age15To20, Gender::Female));
        }
        assert_eq!(agg.sample_count(), MAX_SAMPLES);
    }

    #[test]
    fn test_eviction_shifts_the_mode() {
        let mut agg = DemographicAggregate::new();
        // 6 old samples, then 10 newer ones push them all out
        for _ in 0..6 {
            agg.observe(&obs(AgeBracket::Age60To100, Gender::Male));
        }
        for _ in 0..10 {
            agg.observe(&obs(AgeBracket::Age25To32, Gender::Female));
        }
        assert_eq!(agg.age_mode(), Some(AgeBracket::Age25To32));
        assert_eq!(agg.gender_mode(), Some(Gender::Female));
    }

    #[test]
    fn test_single_sample_is_the_mode() {
        let mut agg = DemographicAggregate::new();
        agg.observe(&obs(AgeBracket::Age8To12, Gender::Male));
        assert_eq!(agg.age_mode(), Some(AgeBracket::Age8To12));
        assert_eq!(agg.gender_mode(), Some(Gender::Male));
    }
}
