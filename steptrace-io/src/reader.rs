//! Memory-mapped event readers.
//!

use crate::{Error, Result};
use memmap2::Mmap;
use steptrace_core::{EventRecordSet, RecordSource};
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without copying the whole file
/// into a heap buffer before decoding.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Returns the path the reader was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads events stored as one JSON array of particle records per file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordSource;

impl JsonRecordSource {
    /// Creates a new JSON event reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reads and decodes the event stored at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped, is empty, or is not a
    /// JSON array of particle records.
    pub fn read_event<P: AsRef<Path>>(&self, path: P) -> Result<EventRecordSet> {
        let path = path.as_ref();
        if std::fs::metadata(path)?.len() == 0 {
            return Err(Error::InvalidFormat(format!(
                "empty event file: {}",
                path.display()
            )));
        }
        let reader = MappedFileReader::open(path)?;
        let event: EventRecordSet = serde_json::from_slice(reader.as_bytes())?;
        log::debug!(
            "loaded {} records from {}",
            event.len(),
            reader.path().display()
        );
        Ok(event)
    }
}

impl RecordSource for JsonRecordSource {
    fn load_event(&self, path: &Path) -> steptrace_core::Result<EventRecordSet> {
        self.read_event(path)
            .map_err(|err| steptrace_core::Error::event_load(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use steptrace_core::TrackId;
    use tempfile::NamedTempFile;

    const EVENT: &str = r#"[
        {"particle": "neutron", "track_id": 1, "parent_id": 0,
         "x_mm": [0.0, 5.0], "y_mm": [0.0, 0.0], "z_mm": [0.0, 0.0],
         "ProcName": ["initStep", "nCapture"], "NextVolume": ["World", "GdLS"]},
        {"particle": "gamma", "track_id": 2, "parent_id": 1,
         "x_mm": [5.0], "y_mm": [0.0], "z_mm": [0.0],
         "ProcName": ["initStep"], "NextVolume": "GdLS"}
    ]"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_event() {
        let file = write_temp(EVENT);
        let event = JsonRecordSource::new().read_event(file.path()).unwrap();
        assert_eq!(event.len(), 2);
        assert_eq!(event.records()[0].track_id, TrackId::Single(1));
        assert_eq!(event.records()[1].final_volume(), Some("GdLS"));
    }

    #[test]
    fn test_empty_file_is_invalid() {
        let file = NamedTempFile::new().unwrap();
        let err = JsonRecordSource::new().read_event(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_record_source_wraps_errors() {
        let file = write_temp("{not json");
        let err = JsonRecordSource::new().load_event(file.path()).unwrap_err();
        assert!(matches!(err, steptrace_core::Error::EventLoad { .. }));
    }

    #[test]
    fn test_mapped_reader_len() {
        let file = write_temp(EVENT);
        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.len(), EVENT.len());
        assert_eq!(reader.path(), file.path());
    }
}
