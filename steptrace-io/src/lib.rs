//! steptrace-io: Event loading and batch extraction for steptrace.
//!
//! This crate reads JSON event files through memory-mapped I/O (memmap2),
//! runs species extraction over whole directories on a rayon pool and
//! writes analysis summaries.
//!

mod batch;
mod error;
mod reader;
mod writer;

pub use batch::{
    discover_event_files, extract_all, extract_all_with, extract_file, extract_with,
    BatchConfig, BatchExtraction,
};
pub use error::{Error, Result};
pub use reader::{JsonRecordSource, MappedFileReader};
pub use writer::DataFileWriter;
