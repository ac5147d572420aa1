//! Step positions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in detector coordinates, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns true if both points are bit-for-bit the same coordinates.
    ///
    /// Secondaries are created at exactly the step point of their parent, so
    /// no tolerance is applied.
    #[inline]
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn coincides_with(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl From<[f64; 3]> for Position {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}
