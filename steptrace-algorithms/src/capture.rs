//! Neutron-capture classification.
//!
//! A capture product is a child of the primary created exactly at the
//! primary's final step point. The primary's end-of-track state is read from
//! its own record in the full event, which is re-loaded from the record's
//! `filename`.

use steptrace_core::{ParticleRecord, RecordSource, Result, TrackNumber};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Species never reported as capture products (radiative and ionization secondaries).
pub const EXCLUDED_PRODUCT_SPECIES: [&str; 2] = ["gamma", "e-"];

/// End-of-track state of a primary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaptureClassification {
    /// Volume the primary ended in.
    pub final_volume: String,
    /// Process that ended the primary.
    pub final_process: String,
    /// Species of the capture product, if one was emitted at the end point.
    pub capture_product: Option<String>,
}

/// Set of species tags, built from one tag or a list of tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpeciesSet(Vec<String>);

impl SpeciesSet {
    /// Returns true if `species` is in the set.
    #[must_use]
    pub fn contains(&self, species: &str) -> bool {
        self.0.iter().any(|s| s == species)
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the tags.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for SpeciesSet {
    fn from(species: &str) -> Self {
        Self(vec![species.to_string()])
    }
}

impl From<String> for SpeciesSet {
    fn from(species: String) -> Self {
        Self(vec![species])
    }
}

impl From<&[&str]> for SpeciesSet {
    fn from(species: &[&str]) -> Self {
        species.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for SpeciesSet {
    fn from(species: [&str; N]) -> Self {
        species.into_iter().collect()
    }
}

impl From<Vec<String>> for SpeciesSet {
    fn from(species: Vec<String>) -> Self {
        Self(species)
    }
}

impl<'a> FromIterator<&'a str> for SpeciesSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// Result of one pass over the primary's event.
struct CaptureScan<'e> {
    final_volume: &'e str,
    final_process: &'e str,
    product: Option<&'e ParticleRecord>,
}

/// Scans `event` for the primary's own record and its capture product.
///
/// Returns `None` if the own record is absent or has no terminal step. When
/// several children qualify, the last one in file order is reported.
fn scan_capture<'e, F>(
    primary: &ParticleRecord,
    event: &'e [ParticleRecord],
    accept_species: F,
) -> Option<CaptureScan<'e>>
where
    F: Fn(&str) -> bool,
{
    let track: TrackNumber = primary.track_id.canonical()?;
    let end_point = primary.last_position();

    let mut terminal = None;
    let mut product = None;

    for record in event {
        if record.track_id.is_parent_of(track) {
            match (record.final_volume(), record.final_process()) {
                (Some(volume), Some(process)) => terminal = Some((volume, process)),
                _ => return None,
            }
        }
        if record.parent_id == track && accept_species(record.particle.as_str()) {
            let coincident = match (record.first_position(), end_point) {
                (Ok(start), Ok(end)) => start.coincides_with(&end),
                // No position data: not a capture product.
                _ => false,
            };
            if coincident {
                product = Some(record);
            }
        }
    }

    let (final_volume, final_process) = terminal?;
    Some(CaptureScan {
        final_volume,
        final_process,
        product,
    })
}

/// Classifies the end of `primary` within an already loaded event.
///
/// Returns `None` when the primary's own record is missing from the event
/// or carries no terminal process/volume.
#[must_use]
pub fn classify_capture_in(
    primary: &ParticleRecord,
    event: &[ParticleRecord],
) -> Option<CaptureClassification> {
    let scan = scan_capture(primary, event, |species| {
        !EXCLUDED_PRODUCT_SPECIES.contains(&species)
    })?;
    Some(CaptureClassification {
        final_volume: scan.final_volume.to_string(),
        final_process: scan.final_process.to_string(),
        capture_product: scan.product.map(|p| p.particle.clone()),
    })
}

/// Returns `primary` if a child of an allowed species was emitted at its end point.
///
/// Returns `None` when no such child exists, or when the primary's own record
/// is missing from the event or carries no terminal process/volume.
#[must_use]
pub fn filter_by_capture_in<'p>(
    primary: &'p ParticleRecord,
    event: &[ParticleRecord],
    allowed: &SpeciesSet,
) -> Option<&'p ParticleRecord> {
    let scan = scan_capture(primary, event, |species| allowed.contains(species))?;
    scan.product.map(|_| primary)
}

/// Capture classification backed by a record source.
#[derive(Debug, Clone)]
pub struct CaptureClassifier<S> {
    source: S,
}

impl<S: RecordSource> CaptureClassifier<S> {
    /// Creates a classifier that re-loads events from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying record source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Classifies the end of `primary` (see [`classify_capture_in`]).
    ///
    /// # Errors
    /// Returns an error if the primary has no filename or its event cannot be loaded.
    pub fn classify(&self, primary: &ParticleRecord) -> Result<Option<CaptureClassification>> {
        let event = self.source.load_event_of(primary)?;
        Ok(classify_capture_in(primary, event.records()))
    }

    /// Keeps `primary` if it produced an allowed species at its end point
    /// (see [`filter_by_capture_in`]).
    ///
    /// # Errors
    /// Returns an error if the primary has no filename or its event cannot be loaded.
    pub fn filter<'p>(
        &self,
        primary: &'p ParticleRecord,
        allowed: &SpeciesSet,
    ) -> Result<Option<&'p ParticleRecord>> {
        let event = self.source.load_event_of(primary)?;
        Ok(filter_by_capture_in(primary, event.records(), allowed))
    }
}

/// Classifies the end of `primary`, re-loading its event from `source`.
///
/// # Errors
/// Returns an error if the primary has no filename or its event cannot be loaded.
pub fn classify_capture<S: RecordSource>(
    primary: &ParticleRecord,
    source: &S,
) -> Result<Option<CaptureClassification>> {
    CaptureClassifier::new(source).classify(primary)
}

/// Keeps `primary` if it produced one of `allowed` at its end point,
/// re-loading its event from `source`.
///
/// # Errors
/// Returns an error if the primary has no filename or its event cannot be loaded.
pub fn filter_by_capture<'p, S: RecordSource>(
    primary: &'p ParticleRecord,
    allowed: impl Into<SpeciesSet>,
    source: &S,
) -> Result<Option<&'p ParticleRecord>> {
    CaptureClassifier::new(source).filter(primary, &allowed.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steptrace_core::{InMemorySource, TrackId};

    fn child(particle: &str, track: i64, start: [f64; 3]) -> ParticleRecord {
        ParticleRecord::new(particle, track, 1).with_step(start, "initStep", "V1")
    }

    fn neutron() -> ParticleRecord {
        ParticleRecord::new("neutron", 1, -1)
            .with_step([0.0, 0.0, 0.0], "a", "V1")
            .with_step([5.0, 0.0, 0.0], "nCapture", "V1")
    }

    #[test]
    fn test_excluded_species_never_reported() {
        let event = vec![
            neutron(),
            child("gamma", 2, [5.0, 0.0, 0.0]),
            child("e-", 3, [5.0, 0.0, 0.0]),
        ];
        let result = classify_capture_in(&event[0], &event).unwrap();
        assert_eq!(result.final_process, "nCapture");
        assert_eq!(result.final_volume, "V1");
        assert_eq!(result.capture_product, None);
    }

    #[test]
    fn test_last_match_wins() {
        let event = vec![
            neutron(),
            child("alpha", 2, [5.0, 0.0, 0.0]),
            child("Li7", 3, [5.0, 0.0, 0.0]),
            child("proton", 4, [4.0, 0.0, 0.0]),
        ];
        let result = classify_capture_in(&event[0], &event).unwrap();
        assert_eq!(result.capture_product.as_deref(), Some("Li7"));
    }

    #[test]
    fn test_missing_own_record_is_unknown() {
        let event = vec![child("triton", 2, [5.0, 0.0, 0.0])];
        assert_eq!(classify_capture_in(&neutron(), &event), None);
        assert_eq!(filter_by_capture_in(&neutron(), &event, &"triton".into()), None);
    }

    #[test]
    fn test_empty_terminal_fields_are_unknown() {
        let mut own = neutron();
        own.proc_name.clear();
        let event = vec![own, child("triton", 2, [5.0, 0.0, 0.0])];
        assert_eq!(classify_capture_in(&neutron(), &event), None);
    }

    #[test]
    fn test_filter_with_empty_terminal_fields_is_none() {
        let mut own = neutron();
        own.proc_name.clear();
        own.next_volume.clear();
        let event = vec![own, child("triton", 2, [5.0, 0.0, 0.0])];
        assert_eq!(filter_by_capture_in(&neutron(), &event, &"triton".into()), None);
    }

    #[test]
    fn test_filter_requires_coincident_start() {
        let event = vec![neutron(), child("triton", 2, [4.0, 0.0, 0.0])];
        assert_eq!(filter_by_capture_in(&event[0], &event, &"triton".into()), None);

        let primary = neutron().with_filename("event.json");
        let source = InMemorySource::new().with_event("event.json", event);
        assert_eq!(filter_by_capture(&primary, "triton", &source).unwrap(), None);
    }

    #[test]
    fn test_child_without_position_is_skipped() {
        let event = vec![neutron(), ParticleRecord::new("triton", 2, 1)];
        let result = classify_capture_in(&event[0], &event).unwrap();
        assert_eq!(result.capture_product, None);
    }

    #[test]
    fn test_merged_primary_resolves_last_segment() {
        let mut own = neutron();
        own.track_id = TrackId::Single(7);
        let event = vec![
            own,
            ParticleRecord::new("C13", 8, 7).with_step([5.0, 0.0, 0.0], "initStep", "V1"),
        ];
        let mut merged = neutron();
        merged.track_id = TrackId::Segments(vec![1, 7]);
        let result = classify_capture_in(&merged, &event).unwrap();
        assert_eq!(result.capture_product.as_deref(), Some("C13"));
    }

    #[test]
    fn test_filter_by_allowlist() {
        let event = vec![
            neutron(),
            child("gamma", 2, [5.0, 0.0, 0.0]),
            child("triton", 3, [5.0, 0.0, 0.0]),
        ];
        let primary = neutron().with_filename("event.json");
        let source = InMemorySource::new().with_event("event.json", event);

        let kept = filter_by_capture(&primary, "triton", &source).unwrap();
        assert_eq!(kept, Some(&primary));
        let kept = filter_by_capture(&primary, ["alpha", "gamma"], &source).unwrap();
        assert_eq!(kept, Some(&primary));
        assert_eq!(filter_by_capture(&primary, "alpha", &source).unwrap(), None);
    }

    #[test]
    fn test_classify_requires_filename() {
        let source = InMemorySource::new();
        assert!(classify_capture(&neutron(), &source).is_err());
    }
}
