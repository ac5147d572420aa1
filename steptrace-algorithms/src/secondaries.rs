//! Aggregate statistics over the secondaries of a captured primary.

use std::collections::{HashSet, VecDeque};

use steptrace_core::{ParticleRecord, RecordSource, Result, TrackNumber};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Species tag of optical photons.
pub const OPTICAL_PHOTON: &str = "opticalphoton";

/// Configuration for secondary statistics.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondaryStatsConfig {
    /// Substring identifying photomultiplier boundary volumes.
    pub pmt_volume_marker: String,
}

impl Default for SecondaryStatsConfig {
    fn default() -> Self {
        Self {
            pmt_volume_marker: "Water_PMT_".to_string(),
        }
    }
}

impl SecondaryStatsConfig {
    /// Sets the PMT volume marker.
    #[must_use]
    pub fn with_pmt_volume_marker(mut self, marker: impl Into<String>) -> Self {
        self.pmt_volume_marker = marker.into();
        self
    }
}

/// Counts describing the secondaries produced at a primary's end point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondaryStatistics {
    /// Records in the whole event.
    pub n_particles: usize,
    /// Direct children created at the primary's final step point.
    pub n_primary_secondaries: usize,
    /// Those children plus all of their descendants.
    pub n_total_secondaries: usize,
    /// Secondaries that produced nothing themselves.
    pub n_final_secondaries: usize,
    /// Final secondaries that are optical photons.
    pub n_final_optical_photons: usize,
    /// Final optical photons that ended in a PMT volume.
    pub n_pmt_endpoints: usize,
}

impl SecondaryStatistics {
    /// Adds another set of counts to this one.
    pub fn accumulate(&mut self, other: &Self) {
        self.n_particles += other.n_particles;
        self.n_primary_secondaries += other.n_primary_secondaries;
        self.n_total_secondaries += other.n_total_secondaries;
        self.n_final_secondaries += other.n_final_secondaries;
        self.n_final_optical_photons += other.n_final_optical_photons;
        self.n_pmt_endpoints += other.n_pmt_endpoints;
    }
}

/// Computes secondary statistics for `primary` within an already loaded event.
///
/// Direct secondaries must start exactly at the primary's final step point;
/// candidates without position data are skipped. Their descendants are
/// followed without a position requirement.
#[must_use]
pub fn secondary_statistics_in(
    primary: &ParticleRecord,
    event: &[ParticleRecord],
    config: &SecondaryStatsConfig,
) -> SecondaryStatistics {
    let mut stats = SecondaryStatistics {
        n_particles: event.len(),
        ..SecondaryStatistics::default()
    };

    let (Some(track), Ok(end_point)) = (primary.track_id.canonical(), primary.last_position())
    else {
        return stats;
    };

    let mut included = vec![false; event.len()];
    let mut queue: VecDeque<TrackNumber> = VecDeque::new();

    for (i, record) in event.iter().enumerate() {
        if record.parent_id != track {
            continue;
        }
        let Ok(start) = record.first_position() else {
            continue;
        };
        if start.coincides_with(&end_point) {
            included[i] = true;
            stats.n_primary_secondaries += 1;
            queue.extend(record.track_id.as_single());
        }
    }

    let mut expanded: HashSet<TrackNumber> = HashSet::from([track]);
    while let Some(parent) = queue.pop_front() {
        if !expanded.insert(parent) {
            continue;
        }
        for (i, record) in event.iter().enumerate() {
            if record.parent_id == parent && !included[i] {
                included[i] = true;
                queue.extend(record.track_id.as_single());
            }
        }
    }

    let secondaries: Vec<&ParticleRecord> = event
        .iter()
        .zip(&included)
        .filter_map(|(record, &keep)| keep.then_some(record))
        .collect();
    stats.n_total_secondaries = secondaries.len();

    let parents: HashSet<TrackNumber> = secondaries.iter().map(|r| r.parent_id).collect();
    for record in secondaries
        .iter()
        .filter(|r| !r.track_id.segments().iter().any(|id| parents.contains(id)))
    {
        stats.n_final_secondaries += 1;
        if record.is(OPTICAL_PHOTON) {
            stats.n_final_optical_photons += 1;
            if record
                .final_volume()
                .is_some_and(|volume| volume.contains(&config.pmt_volume_marker))
            {
                stats.n_pmt_endpoints += 1;
            }
        }
    }

    stats
}

/// Computes secondary statistics for `primary`, re-loading its event from `source`.
///
/// # Errors
/// Returns an error if the primary has no filename or its event cannot be loaded.
pub fn get_neutron_secondaries<S: RecordSource>(
    primary: &ParticleRecord,
    source: &S,
    config: &SecondaryStatsConfig,
) -> Result<SecondaryStatistics> {
    let event = source.load_event_of(primary)?;
    Ok(secondary_statistics_in(primary, event.records(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use steptrace_core::TrackId;

    fn step(particle: &str, track: i64, parent: i64, start: [f64; 3], volume: &str) -> ParticleRecord {
        ParticleRecord::new(particle, track, parent).with_step(start, "initStep", volume)
    }

    fn event() -> Vec<ParticleRecord> {
        let end = [5.0, 0.0, 0.0];
        vec![
            ParticleRecord::new("neutron", 1, 0)
                .with_step([0.0, 0.0, 0.0], "initStep", "GdLS")
                .with_step(end, "nCapture", "GdLS"),
            step("gamma", 2, 1, end, "GdLS"),
            step("gamma", 3, 1, end, "GdLS"),
            // Elastic recoil along the way: not a capture secondary.
            step("proton", 4, 1, [1.0, 0.0, 0.0], "GdLS"),
            step("e-", 5, 2, [6.0, 0.0, 0.0], "GdLS"),
            step("opticalphoton", 6, 5, [6.1, 0.0, 0.0], "Water_PMT_12"),
            step("opticalphoton", 7, 5, [6.2, 0.0, 0.0], "Tank"),
            step("opticalphoton", 8, 4, [1.1, 0.0, 0.0], "Water_PMT_3"),
        ]
    }

    #[test]
    fn test_counts() {
        let event = event();
        let stats = secondary_statistics_in(&event[0], &event, &SecondaryStatsConfig::default());
        assert_eq!(
            stats,
            SecondaryStatistics {
                n_particles: 8,
                n_primary_secondaries: 2,
                n_total_secondaries: 5,
                n_final_secondaries: 3,
                n_final_optical_photons: 2,
                n_pmt_endpoints: 1,
            }
        );
    }

    #[test]
    fn test_candidates_without_position_are_skipped() {
        let mut event = event();
        event[2].x_mm.clear();
        let stats = secondary_statistics_in(&event[0], &event, &SecondaryStatsConfig::default());
        assert_eq!(stats.n_primary_secondaries, 1);
        assert_eq!(stats.n_total_secondaries, 4);
    }

    #[test]
    fn test_merged_primary_uses_last_segment() {
        let event = event();
        let mut merged = event[0].clone();
        merged.track_id = TrackId::Segments(vec![42, 1]);
        let stats = secondary_statistics_in(&merged, &event, &SecondaryStatsConfig::default());
        assert_eq!(stats.n_primary_secondaries, 2);
    }

    #[test]
    fn test_custom_pmt_marker() {
        let event = event();
        let config = SecondaryStatsConfig::default().with_pmt_volume_marker("Tank");
        let stats = secondary_statistics_in(&event[0], &event, &config);
        assert_eq!(stats.n_pmt_endpoints, 1);
    }

    #[test]
    fn test_accumulate() {
        let mut total = SecondaryStatistics::default();
        let one = SecondaryStatistics {
            n_particles: 3,
            n_pmt_endpoints: 1,
            ..SecondaryStatistics::default()
        };
        total.accumulate(&one);
        total.accumulate(&one);
        assert_eq!(total.n_particles, 6);
        assert_eq!(total.n_pmt_endpoints, 2);
    }
}
