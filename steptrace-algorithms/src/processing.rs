//! Parallel helpers applying the per-primary analyses across many primaries.
//!
//! Each primary re-loads its own event, so primaries are independent and are
//! processed on the rayon pool. Output order matches input order, and a
//! primary whose event cannot be loaded is reported without discarding the
//! others.

use rayon::prelude::*;
use steptrace_core::{Error, ParticleRecord, RecordSource, Result};

use crate::capture::{CaptureClassification, CaptureClassifier, SpeciesSet};
use crate::secondaries::{get_neutron_secondaries, SecondaryStatistics, SecondaryStatsConfig};

/// Outcome of running one analysis over many primaries.
#[derive(Debug)]
pub struct PrimaryOutcomes<T> {
    /// Results keyed by the primary's index in the input slice, in input order.
    pub results: Vec<(usize, T)>,
    /// Primaries whose event could not be loaded.
    pub failures: Vec<(usize, Error)>,
}

impl<T> PrimaryOutcomes<T> {
    fn from_results(primaries: &[ParticleRecord], outcomes: Vec<Result<T>>) -> Self {
        let mut results = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) => results.push((index, value)),
                Err(err) => {
                    log::warn!("skipping primary {}: {err}", primaries[index].track_id);
                    failures.push((index, err));
                }
            }
        }
        Self { results, failures }
    }

    /// Returns true if every primary was analysed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Iterates over the successful results, dropping their indices.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.results.iter().map(|(_, value)| value)
    }

    /// Consumes the outcomes, keeping only the successful results.
    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.results.into_iter().map(|(_, value)| value).collect()
    }
}

/// Classifies every primary; `None` results mark primaries with insufficient data.
pub fn classify_captures<S: RecordSource>(
    primaries: &[ParticleRecord],
    source: &S,
) -> PrimaryOutcomes<Option<CaptureClassification>> {
    let classifier = CaptureClassifier::new(source);
    let outcomes = primaries
        .par_iter()
        .map(|primary| classifier.classify(primary))
        .collect();
    PrimaryOutcomes::from_results(primaries, outcomes)
}

/// Keeps the primaries that produced one of `allowed` at their end point.
pub fn filter_captures<'p, S: RecordSource>(
    primaries: &'p [ParticleRecord],
    allowed: &SpeciesSet,
    source: &S,
) -> PrimaryOutcomes<&'p ParticleRecord> {
    let classifier = CaptureClassifier::new(source);
    let outcomes: Vec<Result<Option<&ParticleRecord>>> = primaries
        .par_iter()
        .map(|primary| classifier.filter(primary, allowed))
        .collect();
    let PrimaryOutcomes { results, failures } = PrimaryOutcomes::from_results(primaries, outcomes);
    PrimaryOutcomes {
        results: results
            .into_iter()
            .filter_map(|(index, kept)| kept.map(|primary| (index, primary)))
            .collect(),
        failures,
    }
}

/// Computes secondary statistics for every primary.
pub fn collect_secondary_statistics<S: RecordSource>(
    primaries: &[ParticleRecord],
    source: &S,
    config: &SecondaryStatsConfig,
) -> PrimaryOutcomes<SecondaryStatistics> {
    let outcomes = primaries
        .par_iter()
        .map(|primary| get_neutron_secondaries(primary, source, config))
        .collect();
    PrimaryOutcomes::from_results(primaries, outcomes)
}
