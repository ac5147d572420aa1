//! steptrace-algorithms: Analyses over per-event particle records.
//!
//! This crate provides:
//! - **Secondary tracing** - recursive parent/child walk with an optional
//!   end-point coincidence gate
//! - **Capture classification** - terminal state and capture product of a primary
//! - **Secondary statistics** - counts of secondaries, leaves and PMT hits
//! - **Histograms** - categorical counts with an underflow series
//!
#![warn(missing_docs)]

mod capture;
mod histogram;
mod processing;
mod secondaries;
mod tracer;

pub use capture::{
    classify_capture, classify_capture_in, filter_by_capture, filter_by_capture_in,
    CaptureClassification, CaptureClassifier, SpeciesSet, EXCLUDED_PRODUCT_SPECIES,
};
pub use histogram::{create_histogram, histogram, Histogram};
pub use processing::{
    classify_captures, collect_secondary_statistics, filter_captures, PrimaryOutcomes,
};
pub use secondaries::{
    get_neutron_secondaries, secondary_statistics_in, SecondaryStatistics, SecondaryStatsConfig,
    OPTICAL_PHOTON,
};
pub use tracer::{trace_secondaries, SecondaryTracer, TraceConfig, DEFAULT_MAX_DEPTH};

// Re-export core record types
pub use steptrace_core::{EventRecordSet, ParticleRecord, RecordSource, TrackId, TrackNumber};
