//! steptrace-core: Core types and traits for Monte Carlo particle-record analysis.
//!
//! This crate provides the per-event record model, track identities,
//! step positions, the record source abstraction and species extraction
//! with segment merging.
//!

pub mod error;
pub mod extraction;
pub mod position;
pub mod record;
pub mod source;
pub mod track;

pub use error::{Error, PositionError, Result};
pub use extraction::{merge_segments, ExtractionConfig, MergePolicy, ParticleExtractor, RecordField};
pub use position::Position;
pub use record::{EventRecordSet, ParticleRecord};
pub use source::{InMemorySource, RecordSource};
pub use track::{TrackId, TrackNumber};
