//! Output writers for extracted records and analysis summaries.

use crate::Result;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use steptrace_algorithms::{Histogram, SecondaryStatistics};
use steptrace_core::ParticleRecord;

/// Writer for analysis output.
pub struct DataFileWriter {
    writer: BufWriter<File>,
}

impl DataFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes records as a JSON array, readable back as an event file.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn write_records_json(&mut self, records: &[ParticleRecord]) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, records)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a histogram as CSV, underflow bins flagged in the last column.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn write_histogram_csv<T: Display>(&mut self, histogram: &Histogram<T>) -> Result<()> {
        writeln!(self.writer, "bin,count,underflow")?;
        for (bin, count) in histogram.iter() {
            writeln!(self.writer, "{bin},{count},false")?;
        }
        for (bin, count) in histogram.iter_underflow() {
            writeln!(self.writer, "{bin},{count},true")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes per-primary secondary statistics as CSV.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn write_statistics_csv(&mut self, stats: &[SecondaryStatistics]) -> Result<()> {
        writeln!(
            self.writer,
            "n_particles,n_primary_secondaries,n_total_secondaries,n_final_secondaries,n_final_optical_photons,n_pmt_endpoints"
        )?;
        for s in stats {
            writeln!(
                self.writer,
                "{},{},{},{},{},{}",
                s.n_particles,
                s.n_primary_secondaries,
                s.n_total_secondaries,
                s.n_final_secondaries,
                s.n_final_optical_photons,
                s.n_pmt_endpoints
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonRecordSource;
    use steptrace_algorithms::histogram;
    use steptrace_core::TrackId;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_histogram_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = DataFileWriter::create(file.path()).unwrap();

        let h = histogram(&["Gd158", "Gd158", "H2"], Some(1));
        writer.write_histogram_csv(&h).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("bin,count,underflow\n"));
        assert!(content.contains("Gd158,2,false"));
        assert!(content.contains("H2,1,true"));
    }

    #[test]
    fn test_write_statistics_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = DataFileWriter::create(file.path()).unwrap();

        let stats = SecondaryStatistics {
            n_particles: 40,
            n_primary_secondaries: 3,
            n_total_secondaries: 30,
            n_final_secondaries: 20,
            n_final_optical_photons: 15,
            n_pmt_endpoints: 2,
        };
        writer.write_statistics_csv(&[stats]).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content.lines().nth(1), Some("40,3,30,20,15,2"));
    }

    #[test]
    fn test_records_json_round_trips_as_event() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = DataFileWriter::create(file.path()).unwrap();

        let mut record = ParticleRecord::new("neutron", 1, 0)
            .with_step([0.0, 0.0, 0.0], "initStep", "World")
            .with_filename("run/e0.json");
        record.track_id = TrackId::Segments(vec![1, 4]);
        writer.write_records_json(std::slice::from_ref(&record)).unwrap();

        let event = JsonRecordSource::new().read_event(file.path()).unwrap();
        assert_eq!(event.records(), &[record]);
    }
}
