//! Particle records and per-event record sets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::PositionError;
use crate::position::Position;
use crate::track::{TrackId, TrackNumber};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

/// One tracked particle within one simulated event.
///
/// The step sequences (`x_mm`, `y_mm`, `z_mm`, `proc_name`, `next_volume`)
/// hold one entry per recorded step: the first entry is the creation point,
/// the last one is where the track ended.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleRecord {
    /// Species tag, e.g. `neutron`, `gamma`, `opticalphoton`.
    pub particle: String,
    /// Track identity (segment list after merging).
    pub track_id: TrackId,
    /// Track number of the producing particle; non-positive for primaries.
    pub parent_id: TrackNumber,
    #[cfg_attr(feature = "serde", serde(default))]
    pub x_mm: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub y_mm: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub z_mm: Vec<f64>,
    /// Physics process of each step; the last one ended the track.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "ProcName", default, deserialize_with = "one_or_many")
    )]
    pub proc_name: Vec<String>,
    /// Volume entered at each step; the last one is the final volume.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "NextVolume", default, deserialize_with = "one_or_many")
    )]
    pub next_volume: Vec<String>,
    /// File holding the full event this record was extracted from.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub filename: Option<PathBuf>,
}

impl ParticleRecord {
    /// Creates a single-segment record with no recorded steps.
    pub fn new(particle: impl Into<String>, track: TrackNumber, parent_id: TrackNumber) -> Self {
        Self {
            particle: particle.into(),
            track_id: TrackId::Single(track),
            parent_id,
            ..Self::default()
        }
    }

    /// Appends one step.
    #[must_use]
    pub fn with_step(
        mut self,
        position: impl Into<Position>,
        process: impl Into<String>,
        volume: impl Into<String>,
    ) -> Self {
        let position = position.into();
        self.x_mm.push(position.x);
        self.y_mm.push(position.y);
        self.z_mm.push(position.z);
        self.proc_name.push(process.into());
        self.next_volume.push(volume.into());
        self
    }

    /// Sets the source filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns true if the record names a producing particle.
    #[inline]
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent_id > 0
    }

    /// Returns true if the species tag equals `species`.
    #[inline]
    #[must_use]
    pub fn is(&self, species: &str) -> bool {
        self.particle == species
    }

    /// Number of recorded steps (length of the longest step sequence).
    #[must_use]
    pub fn step_count(&self) -> usize {
        [
            self.x_mm.len(),
            self.y_mm.len(),
            self.z_mm.len(),
            self.proc_name.len(),
            self.next_volume.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Creation point.
    ///
    /// # Errors
    /// Returns [`PositionError::NoPositionData`] if any coordinate sequence is empty.
    pub fn first_position(&self) -> Result<Position, PositionError> {
        match (self.x_mm.first(), self.y_mm.first(), self.z_mm.first()) {
            (Some(&x), Some(&y), Some(&z)) => Ok(Position::new(x, y, z)),
            _ => Err(PositionError::NoPositionData),
        }
    }

    /// Final step point.
    ///
    /// # Errors
    /// Returns [`PositionError::NoPositionData`] if any coordinate sequence is empty.
    pub fn last_position(&self) -> Result<Position, PositionError> {
        match (self.x_mm.last(), self.y_mm.last(), self.z_mm.last()) {
            (Some(&x), Some(&y), Some(&z)) => Ok(Position::new(x, y, z)),
            _ => Err(PositionError::NoPositionData),
        }
    }

    /// Process that ended the track.
    #[must_use]
    pub fn final_process(&self) -> Option<&str> {
        self.proc_name.last().map(String::as_str)
    }

    /// Volume the track ended in.
    #[must_use]
    pub fn final_volume(&self) -> Option<&str> {
        self.next_volume.last().map(String::as_str)
    }
}

#[cfg(feature = "serde")]
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// All particle records produced by one simulated event, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EventRecordSet {
    records: Vec<ParticleRecord>,
}

impl EventRecordSet {
    /// Wraps an ordered list of records.
    #[must_use]
    pub fn new(records: Vec<ParticleRecord>) -> Self {
        Self { records }
    }

    /// Returns the records in file order.
    #[must_use]
    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    /// Consumes the set, returning the records.
    #[must_use]
    pub fn into_records(self) -> Vec<ParticleRecord> {
        self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the event holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, ParticleRecord> {
        self.records.iter()
    }

    /// Returns the first record whose own (scalar) track number is `track`.
    #[must_use]
    pub fn find_track(&self, track: TrackNumber) -> Option<&ParticleRecord> {
        self.records.iter().find(|r| r.track_id.is_parent_of(track))
    }

    /// Returns the records directly produced by `track`, in file order.
    pub fn children_of(&self, track: TrackNumber) -> impl Iterator<Item = &ParticleRecord> {
        self.records.iter().filter(move |r| r.parent_id == track)
    }

    /// Counts records per species tag.
    #[must_use]
    pub fn species_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.particle.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

impl From<Vec<ParticleRecord>> for EventRecordSet {
    fn from(records: Vec<ParticleRecord>) -> Self {
        Self::new(records)
    }
}

impl AsRef<[ParticleRecord]> for EventRecordSet {
    fn as_ref(&self) -> &[ParticleRecord] {
        &self.records
    }
}

impl FromIterator<ParticleRecord> for EventRecordSet {
    fn from_iter<I: IntoIterator<Item = ParticleRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EventRecordSet {
    type Item = ParticleRecord;
    type IntoIter = std::vec::IntoIter<ParticleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventRecordSet {
    type Item = &'a ParticleRecord;
    type IntoIter = std::slice::Iter<'a, ParticleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
