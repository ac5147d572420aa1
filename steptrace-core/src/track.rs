//! Track identity of particle records.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-event track number as written by the simulation.
pub type TrackNumber = i64;

/// Identity of a particle record within its event.
///
/// Raw records carry a single track number. Records merged from several
/// trajectory segments carry the segment numbers in discovery order; the
/// last one is the canonical id of the logical particle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TrackId {
    /// A single segment.
    Single(TrackNumber),
    /// Segment numbers of a merged record.
    Segments(Vec<TrackNumber>),
}

impl TrackId {
    /// Returns the canonical track number: the scalar itself, or the last segment.
    ///
    /// `None` only for an empty segment list.
    #[must_use]
    pub fn canonical(&self) -> Option<TrackNumber> {
        match self {
            Self::Single(id) => Some(*id),
            Self::Segments(ids) => ids.last().copied(),
        }
    }

    /// Returns the track number if this id is a scalar.
    #[must_use]
    pub fn as_single(&self) -> Option<TrackNumber> {
        match self {
            Self::Single(id) => Some(*id),
            Self::Segments(_) => None,
        }
    }

    /// Returns all segment numbers (one for a scalar id).
    #[must_use]
    pub fn segments(&self) -> &[TrackNumber] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Segments(ids) => ids,
        }
    }

    /// Returns true if a record with this id would be the parent of `parent_id`.
    ///
    /// Only scalar ids match. A segment list never equals a scalar parent id,
    /// even when it holds a single entry.
    #[inline]
    #[must_use]
    pub fn is_parent_of(&self, parent_id: TrackNumber) -> bool {
        matches!(self, Self::Single(id) if *id == parent_id)
    }

    /// Appends the segments of `other`, turning this id into a segment list.
    pub fn push_segments(&mut self, other: &TrackId) {
        let mut ids = self.segments().to_vec();
        ids.extend_from_slice(other.segments());
        *self = Self::Segments(ids);
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::Single(0)
    }
}

impl From<TrackNumber> for TrackId {
    fn from(id: TrackNumber) -> Self {
        Self::Single(id)
    }
}

impl From<Vec<TrackNumber>> for TrackId {
    fn from(ids: Vec<TrackNumber>) -> Self {
        Self::Segments(ids)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(id) => write!(f, "{id}"),
            Self::Segments(ids) => {
                write!(f, "[")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                write!(f, "]")
            }
        }
    }
}
