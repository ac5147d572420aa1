//! Event record sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::record::{EventRecordSet, ParticleRecord};

/// Produces the full record sequence of the event stored at a path.
///
/// Analyses that need more than an extracted record (its siblings and
/// descendants) re-load the event through this trait, using the record's
/// `filename`.
pub trait RecordSource: Send + Sync {
    /// Loads the event stored at `path`.
    ///
    /// # Errors
    /// Returns [`Error::EventLoad`] if the event cannot be read or decoded.
    fn load_event(&self, path: &Path) -> Result<EventRecordSet>;

    /// Loads the event a record was extracted from.
    ///
    /// # Errors
    /// Returns [`Error::MissingFilename`] if the record carries no filename,
    /// or any error of [`RecordSource::load_event`].
    fn load_event_of(&self, record: &ParticleRecord) -> Result<EventRecordSet> {
        let path = record
            .filename
            .as_deref()
            .ok_or_else(|| Error::MissingFilename {
                track_id: record.track_id.to_string(),
            })?;
        self.load_event(path)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn load_event(&self, path: &Path) -> Result<EventRecordSet> {
        (**self).load_event(path)
    }
}

/// Events held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    events: HashMap<PathBuf, EventRecordSet>,
}

impl InMemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the event stored under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, event: impl Into<EventRecordSet>) {
        self.events.insert(path.into(), event.into());
    }

    /// Builder form of [`InMemorySource::insert`].
    #[must_use]
    pub fn with_event(mut self, path: impl Into<PathBuf>, event: impl Into<EventRecordSet>) -> Self {
        self.insert(path, event);
        self
    }
}

impl RecordSource for InMemorySource {
    fn load_event(&self, path: &Path) -> Result<EventRecordSet> {
        self.events
            .get(path)
            .cloned()
            .ok_or_else(|| Error::event_load(path, "no event registered for path"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_event_of_requires_filename() {
        let source = InMemorySource::new()
            .with_event("a.json", vec![ParticleRecord::new("neutron", 1, 0)]);

        let tagged = ParticleRecord::new("neutron", 1, 0).with_filename("a.json");
        assert_eq!(source.load_event_of(&tagged).unwrap().len(), 1);

        let untagged = ParticleRecord::new("neutron", 1, 0);
        assert!(matches!(
            source.load_event_of(&untagged),
            Err(Error::MissingFilename { .. })
        ));
    }

    #[test]
    fn test_unknown_path_is_load_error() {
        let source = InMemorySource::new();
        let err = source.load_event(Path::new("missing.json")).unwrap_err();
        assert!(matches!(err, Error::EventLoad { .. }));
        assert!(err.to_string().contains("missing.json"));
    }
}
