//! Species extraction and segment merging.
//!
//! Long-lived particles are split by the simulation into several records of
//! the same species (the step buffer overflows). Extraction filters one event
//! down to a species and, optionally, stitches those segments back into one
//! logical record.

use std::path::Path;

use crate::record::{EventRecordSet, ParticleRecord};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a field is combined when segments are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Per-step sequence; segments are concatenated in segment order.
    Concatenate,
    /// The first segment's value is kept.
    KeepFirst,
    /// Segment identities are collected into a list.
    CollectSegments,
}

/// Fields of a [`ParticleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Particle,
    TrackId,
    ParentId,
    XMm,
    YMm,
    ZMm,
    ProcName,
    NextVolume,
    Filename,
}

impl RecordField {
    /// Every field, in record order.
    pub const ALL: [RecordField; 9] = [
        Self::Particle,
        Self::TrackId,
        Self::ParentId,
        Self::XMm,
        Self::YMm,
        Self::ZMm,
        Self::ProcName,
        Self::NextVolume,
        Self::Filename,
    ];

    /// Field name as written in event files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Particle => "particle",
            Self::TrackId => "track_id",
            Self::ParentId => "parent_id",
            Self::XMm => "x_mm",
            Self::YMm => "y_mm",
            Self::ZMm => "z_mm",
            Self::ProcName => "ProcName",
            Self::NextVolume => "NextVolume",
            Self::Filename => "filename",
        }
    }

    /// Merge policy of this field.
    #[must_use]
    pub const fn merge_policy(self) -> MergePolicy {
        match self {
            Self::TrackId => MergePolicy::CollectSegments,
            Self::XMm | Self::YMm | Self::ZMm | Self::ProcName | Self::NextVolume => {
                MergePolicy::Concatenate
            }
            Self::Particle | Self::ParentId | Self::Filename => MergePolicy::KeepFirst,
        }
    }

    fn merge_into(self, merged: &mut ParticleRecord, segment: &ParticleRecord) {
        match self {
            Self::TrackId => merged.track_id.push_segments(&segment.track_id),
            Self::XMm => merged.x_mm.extend_from_slice(&segment.x_mm),
            Self::YMm => merged.y_mm.extend_from_slice(&segment.y_mm),
            Self::ZMm => merged.z_mm.extend_from_slice(&segment.z_mm),
            Self::ProcName => merged.proc_name.extend_from_slice(&segment.proc_name),
            Self::NextVolume => merged.next_volume.extend_from_slice(&segment.next_volume),
            Self::Particle | Self::ParentId | Self::Filename => {}
        }
    }
}

/// Merges segments of one logical particle into a single record.
///
/// A single segment is returned unchanged, keeping its scalar track id.
/// Returns `None` for an empty slice.
#[must_use]
pub fn merge_segments(segments: &[ParticleRecord]) -> Option<ParticleRecord> {
    let (first, rest) = segments.split_first()?;
    let mut merged = first.clone();
    for segment in rest {
        for field in RecordField::ALL {
            field.merge_into(&mut merged, segment);
        }
    }
    Some(merged)
}

/// Configuration for species extraction.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractionConfig {
    /// Species tag to keep (default: `neutron`).
    pub species: String,
    /// Merge all matching records of an event into one (default: true).
    pub merge_segments: bool,
    /// Tag extracted records with their source file (default: true).
    pub add_filename: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            species: "neutron".to_string(),
            merge_segments: true,
            add_filename: true,
        }
    }
}

impl ExtractionConfig {
    /// Creates a configuration for `species` with default options.
    #[must_use]
    pub fn for_species(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            ..Self::default()
        }
    }

    /// Set segment merging.
    #[must_use]
    pub fn with_merge_segments(mut self, merge: bool) -> Self {
        self.merge_segments = merge;
        self
    }

    /// Set filename tagging.
    #[must_use]
    pub fn with_add_filename(mut self, add: bool) -> Self {
        self.add_filename = add;
        self
    }
}

/// Filters events down to one species.
#[derive(Clone, Debug, Default)]
pub struct ParticleExtractor {
    config: ExtractionConfig,
}

impl ParticleExtractor {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Get current configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracts the configured species from one event.
    ///
    /// In merge mode the result holds at most one record; otherwise every
    /// matching record is returned in file order. No match yields an empty
    /// vector. `origin` is attached as `filename` when tagging is enabled.
    #[must_use]
    pub fn extract(&self, event: EventRecordSet, origin: Option<&Path>) -> Vec<ParticleRecord> {
        let species = self.config.species.as_str();
        let mut matching: Vec<ParticleRecord> =
            event.into_iter().filter(|r| r.is(species)).collect();

        if self.config.merge_segments {
            matching = merge_segments(&matching).into_iter().collect();
        }

        if self.config.add_filename {
            if let Some(origin) = origin {
                for record in &mut matching {
                    record.filename = Some(origin.to_path_buf());
                }
            }
        }

        matching
    }
}
