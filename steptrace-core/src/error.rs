//! Error types for steptrace-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for steptrace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for steptrace operations.
///
/// Missing or sparse simulation data is not an error; those outcomes are
/// reported through `Option` and empty collections instead.
#[derive(Error, Debug)]
pub enum Error {
    /// A record source failed to produce the event stored at `path`.
    #[error("failed to load event from {}: {source}", path.display())]
    EventLoad {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The record carries no `filename`, so its full event cannot be re-loaded.
    #[error("record with track id {track_id} has no source filename")]
    MissingFilename { track_id: String },
}

impl Error {
    /// Wraps a loader failure for the event at `path`.
    pub fn event_load<P, E>(path: P, source: E) -> Self
    where
        P: Into<PathBuf>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::EventLoad {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Failure to read a step position from a record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// One of the `x_mm`/`y_mm`/`z_mm` sequences has no entry for the step.
    #[error("record has no position data")]
    NoPositionData,
}
