//! File- and directory-level species extraction.
//!
//! Every event file is processed independently on a fixed-size rayon pool.
//! A file that fails to load is reported alongside the results instead of
//! aborting the batch.

use crate::reader::JsonRecordSource;
use crate::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use steptrace_core::{ExtractionConfig, ParticleExtractor, ParticleRecord, RecordSource};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for batch extraction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchConfig {
    /// Worker threads; 0 uses one per available core (default: 1).
    pub worker_count: usize,
    /// Process at most this many files (default: all).
    pub max_files: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            max_files: None,
        }
    }
}

impl BatchConfig {
    /// Sets the worker count.
    #[must_use]
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Caps the number of files processed.
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }
}

/// Outcome of a batch extraction.
#[derive(Debug, Default)]
pub struct BatchExtraction {
    /// Extracted records, in file order.
    pub records: Vec<ParticleRecord>,
    /// Number of files processed successfully.
    pub files_processed: usize,
    /// Files that could not be loaded, with the reason.
    pub failures: Vec<(PathBuf, steptrace_core::Error)>,
}

impl BatchExtraction {
    /// Returns true if every file was processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Lists the regular files directly inside `dir`, sorted by path.
///
/// # Errors
/// Returns an error if the directory cannot be read.
pub fn discover_event_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts records from one event file using `source`.
///
/// # Errors
/// Returns an error if the event cannot be loaded.
pub fn extract_with<S: RecordSource>(
    source: &S,
    extractor: &ParticleExtractor,
    path: &Path,
) -> steptrace_core::Result<Vec<ParticleRecord>> {
    let event = source.load_event(path)?;
    Ok(extractor.extract(event, Some(path)))
}

/// Extracts records from one JSON event file.
///
/// # Errors
/// Returns an error if the event cannot be loaded.
pub fn extract_file<P: AsRef<Path>>(
    path: P,
    config: &ExtractionConfig,
) -> Result<Vec<ParticleRecord>> {
    let extractor = ParticleExtractor::new(config.clone());
    Ok(extract_with(&JsonRecordSource::new(), &extractor, path.as_ref())?)
}

/// Extracts records from every event file in `dir` using `source`.
///
/// # Errors
/// Returns an error if the directory cannot be listed or the worker pool
/// cannot be built. Per-file failures are collected in the result.
pub fn extract_all_with<S, P>(
    source: &S,
    dir: P,
    extraction: &ExtractionConfig,
    batch: &BatchConfig,
) -> Result<BatchExtraction>
where
    S: RecordSource,
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    let mut files = discover_event_files(dir)?;
    log::info!("Base path {}", dir.display());
    log::info!("Found {} event files", files.len());

    if let Some(max_files) = batch.max_files {
        files.truncate(max_files);
    }
    log::info!("Processing {} event files", files.len());

    let pool = ThreadPoolBuilder::new()
        .num_threads(batch.worker_count)
        .build()?;
    let extractor = ParticleExtractor::new(extraction.clone());
    let total = files.len();
    let step = progress_step(total);
    let done = AtomicUsize::new(0);

    let outcomes: Vec<(PathBuf, steptrace_core::Result<Vec<ParticleRecord>>)> =
        pool.install(|| {
            files
                .into_par_iter()
                .map(|path| {
                    let outcome = extract_with(source, &extractor, &path);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if n % step == 0 || n == total {
                        log::info!("Processed {n}/{total} files");
                    }
                    (path, outcome)
                })
                .collect()
        });

    let mut result = BatchExtraction::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(records) => {
                result.files_processed += 1;
                result.records.extend(records);
            }
            Err(err) => {
                log::warn!("skipping {}: {err}", path.display());
                result.failures.push((path, err));
            }
        }
    }

    log::info!("Processing complete");
    log::info!(
        "N. {} extracted: {}",
        extraction.species,
        result.records.len()
    );
    Ok(result)
}

/// Number of files between progress lines: every 10% of the run, at least one.
fn progress_step(total: usize) -> usize {
    (total / 10).max(1)
}

/// Extracts records from every JSON event file in `dir`.
///
/// # Errors
/// Returns an error if the directory cannot be listed or the worker pool
/// cannot be built. Per-file failures are collected in the result.
pub fn extract_all<P: AsRef<Path>>(
    dir: P,
    extraction: &ExtractionConfig,
    batch: &BatchConfig,
) -> Result<BatchExtraction> {
    extract_all_with(&JsonRecordSource::new(), dir, extraction, batch)
}
