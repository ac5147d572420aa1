//!
//! Command-line front end for analysing Monte Carlo particle records.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};

use steptrace_algorithms::{
    classify_captures, collect_secondary_statistics, filter_captures, histogram, Histogram,
    PrimaryOutcomes, SecondaryStatistics, SecondaryStatsConfig, SecondaryTracer, SpeciesSet, TraceConfig,
};
use steptrace_core::{ExtractionConfig, ParticleRecord};
use steptrace_io::{extract_all, BatchConfig, BatchExtraction, DataFileWriter, JsonRecordSource};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    SteptraceIo(#[from] steptrace_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] steptrace_core::Error),

    #[error("track {0} not found in event")]
    TrackNotFound(i64),
}

/// Analysis toolkit for Monte Carlo particle-interaction records.
#[derive(Parser)]
#[command(name = "steptrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the directory-level commands.
#[derive(clap::Args)]
struct BatchArgs {
    /// Directory of event files
    input: PathBuf,

    /// Species to extract
    #[arg(short, long, default_value = "neutron")]
    species: String,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value = "1")]
    workers: usize,

    /// Process at most this many files
    #[arg(long)]
    max_files: Option<usize>,
}

impl BatchArgs {
    fn extract(&self, merge_segments: bool, add_filename: bool) -> Result<BatchExtraction> {
        let extraction = ExtractionConfig::for_species(&self.species)
            .with_merge_segments(merge_segments)
            .with_add_filename(add_filename);
        let mut batch = BatchConfig::default().with_worker_count(self.workers);
        batch.max_files = self.max_files;

        let start = Instant::now();
        let result = extract_all(&self.input, &extraction, &batch)?;
        log::info!(
            "Extracted {} {} record(s) from {} file(s) in {:.2}s",
            result.records.len(),
            self.species,
            result.files_processed,
            start.elapsed().as_secs_f64()
        );
        for (path, err) in &result.failures {
            eprintln!("warning: {}: {}", path.display(), err);
        }
        Ok(result)
    }

    fn with_workers<T>(&self, f: impl FnOnce() -> T + Send) -> Result<T>
    where
        T: Send,
    {
        let pool = rayon_pool(self.workers)?;
        Ok(pool.install(f))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the species content of an event file
    Info {
        /// Input event file
        input: PathBuf,
    },

    /// Extract one species from a directory of event files
    Extract {
        #[command(flatten)]
        batch: BatchArgs,

        /// Keep segments as separate records
        #[arg(long)]
        no_merge: bool,

        /// Do not tag records with their source file
        #[arg(long)]
        no_filename: bool,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the descendants of one track in an event file
    Trace {
        /// Input event file
        input: PathBuf,

        /// Track number of the primary
        #[arg(short, long)]
        track_id: i64,

        /// Keep only direct children created at the primary's end point
        #[arg(long)]
        use_position: bool,

        /// Maximum recursion depth
        #[arg(long, default_value_t = steptrace_algorithms::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Histogram capture products, final processes and final volumes
    Captures {
        #[command(flatten)]
        batch: BatchArgs,

        /// Bins with at most this many entries are listed as underflow
        #[arg(long)]
        min_count: Option<usize>,

        /// Also count primaries whose capture produced one of these species
        #[arg(long, value_delimiter = ',')]
        keep: Vec<String>,

        /// Write the capture-product histogram as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarise secondaries produced at each primary's end point
    Secondaries {
        #[command(flatten)]
        batch: BatchArgs,

        /// Substring marking PMT boundary volumes
        #[arg(long, default_value = "Water_PMT_")]
        pmt_marker: String,

        /// Write per-primary statistics as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn rayon_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|err| steptrace_io::Error::from(err).into())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn print_histogram(title: &str, histogram: &Histogram<String>) {
    const BAR_WIDTH: usize = 50;

    println!("{}", title);
    println!("{:-<72}", "");
    let max = histogram.weights.iter().copied().max().unwrap_or(0).max(1);
    for (bin, count) in histogram.iter() {
        let bar = "#".repeat(count * BAR_WIDTH / max);
        println!("{:<20} {:>8} {}", bin, count, bar);
    }
    if !histogram.underflow_bins.is_empty() {
        let rest: usize = histogram.underflow_weights.iter().sum();
        println!(
            "{:<20} {:>8} ({} bins)",
            "(underflow)",
            rest,
            histogram.underflow_bins.len()
        );
    }
    println!();
}

fn report_failures<T>(primaries: &[ParticleRecord], outcomes: &PrimaryOutcomes<T>) {
    for (index, err) in &outcomes.failures {
        let origin = primaries[*index]
            .filename
            .as_deref()
            .map_or_else(|| "(no filename)".to_string(), |p| p.display().to_string());
        eprintln!("warning: {origin}: {err}");
    }
    if !outcomes.is_complete() {
        eprintln!(
            "warning: {} of {} primaries skipped",
            outcomes.failures.len(),
            primaries.len()
        );
    }
}

fn describe(record: &ParticleRecord) -> String {
    let start = record
        .first_position()
        .map(|p| format!("({:.3}, {:.3}, {:.3})", p.x, p.y, p.z))
        .unwrap_or_else(|_| "-".to_string());
    format!(
        "{:>8} {:>8} {:<16} {:>6} {:<30} {:<16} {}",
        record.track_id,
        record.parent_id,
        record.particle,
        record.step_count(),
        start,
        record.final_process().unwrap_or("-"),
        record.final_volume().unwrap_or("-")
    )
}

fn read_event(path: &Path) -> Result<steptrace_core::EventRecordSet> {
    Ok(JsonRecordSource::new().read_event(path)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let event = read_event(&input)?;
            println!("File: {}", input.display());
            println!("Records: {}", event.len());
            let primaries = event.iter().filter(|r| !r.has_parent()).count();
            println!("Primaries: {}", primaries);
            println!();
            println!("{:<20} {:>8}", "Species", "Count");
            println!("{:-<29}", "");
            for (species, count) in event.species_counts() {
                println!("{:<20} {:>8}", species, count);
            }
        }

        Commands::Extract {
            batch,
            no_merge,
            no_filename,
            output,
        } => {
            let result = batch.extract(!no_merge, !no_filename)?;
            let mut writer = DataFileWriter::create(&output)?;
            writer.write_records_json(&result.records)?;
            println!(
                "Wrote {} record(s) to {}",
                result.records.len(),
                output.display()
            );
        }

        Commands::Trace {
            input,
            track_id,
            use_position,
            max_depth,
        } => {
            let event = read_event(&input)?;
            let primary = event
                .find_track(track_id)
                .ok_or(CliError::TrackNotFound(track_id))?;

            let tracer = SecondaryTracer::new(
                TraceConfig::new()
                    .with_use_position(use_position)
                    .with_max_depth(max_depth),
            );
            let secondaries = tracer.trace(primary, event.records(), None);

            println!(
                "{:>8} {:>8} {:<16} {:>6} {:<30} {:<16} {}",
                "Track", "Parent", "Particle", "Steps", "Start (mm)", "Final proc", "Final volume"
            );
            println!("{:-<110}", "");
            println!("{}", describe(primary));
            for record in &secondaries {
                println!("{}", describe(record));
            }
            println!();
            println!("{} secondaries", secondaries.len());
        }

        Commands::Captures {
            batch,
            min_count,
            keep,
            output,
        } => {
            let result = batch.extract(true, true)?;
            let source = JsonRecordSource::new();
            let primaries = &result.records;

            let outcomes = batch.with_workers(|| classify_captures(primaries, &source))?;
            report_failures(primaries, &outcomes);
            let classes = outcomes.into_values();
            let unknown = classes.iter().filter(|c| c.is_none()).count();

            let mut products = Vec::new();
            let mut processes = Vec::new();
            let mut volumes = Vec::new();
            for class in classes.into_iter().flatten() {
                products.push(
                    class
                        .capture_product
                        .unwrap_or_else(|| "(none)".to_string()),
                );
                processes.push(class.final_process);
                volumes.push(class.final_volume);
            }

            println!("Primaries: {} ({} without terminal data)", primaries.len(), unknown);
            println!();
            let product_histogram = histogram(&products, min_count);
            print_histogram("Capture product", &product_histogram);
            print_histogram("Final process", &histogram(&processes, min_count));
            print_histogram("Final volume", &histogram(&volumes, min_count));

            if !keep.is_empty() {
                let allowed = SpeciesSet::from(keep);
                let kept = batch.with_workers(|| filter_captures(primaries, &allowed, &source))?;
                report_failures(primaries, &kept);
                let names: Vec<&str> = allowed.iter().collect();
                println!("Captures producing {}: {}", names.join(", "), kept.results.len());
            }

            if let Some(output) = output {
                let mut writer = DataFileWriter::create(&output)?;
                writer.write_histogram_csv(&product_histogram)?;
                println!("Wrote capture-product histogram to {}", output.display());
            }
        }

        Commands::Secondaries {
            batch,
            pmt_marker,
            output,
        } => {
            let result = batch.extract(true, true)?;
            let source = JsonRecordSource::new();
            let config = SecondaryStatsConfig::default().with_pmt_volume_marker(pmt_marker);

            let outcomes = batch.with_workers(|| {
                collect_secondary_statistics(&result.records, &source, &config)
            })?;
            report_failures(&result.records, &outcomes);
            let stats = outcomes.into_values();

            let mut total = SecondaryStatistics::default();
            for s in &stats {
                total.accumulate(s);
            }
            let n = stats.len().max(1) as f64;

            println!("Primaries: {}", stats.len());
            println!("{:<28} {:>12} {:>12}", "Quantity", "Total", "Mean");
            println!("{:-<54}", "");
            for (name, value) in [
                ("particles in event", total.n_particles),
                ("direct secondaries", total.n_primary_secondaries),
                ("all secondaries", total.n_total_secondaries),
                ("final secondaries", total.n_final_secondaries),
                ("final optical photons", total.n_final_optical_photons),
                ("optical photons at PMT", total.n_pmt_endpoints),
            ] {
                println!("{:<28} {:>12} {:>12.2}", name, value, value as f64 / n);
            }

            if let Some(output) = output {
                let mut writer = DataFileWriter::create(&output)?;
                writer.write_statistics_csv(&stats)?;
                println!("Wrote per-primary statistics to {}", output.display());
            }
        }
    }

    Ok(())
}
