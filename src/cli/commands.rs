use std::path::Path;
use tracing::info;
use validator::Validate;

use crate::analyzers::{RunSummary, StreamAnalyzer, Task};
use crate::cli::args::{Cli, Commands, Overrides};
use crate::config::StreamConfig;
use crate::error::Result;
use crate::readers::{RecordReader, SynchronizedReader};
use crate::utils::filename::default_output_path;
use crate::utils::progress::ProgressReporter;
use crate::writers::{write_summary_json, ResultWriter};

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = StreamConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli.overrides)?;
    config.validate()?;

    let shards = match cli.overrides.shards {
        Some(0) => num_cpus::get(),
        Some(shards) => shards,
        None => 1,
    };

    let analyzer = StreamAnalyzer::new(config).with_shards(shards);
    let task = cli.command.task();
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(task, cli.command.primary_input()));
    let to_stdout = output.as_path() == Path::new("-");

    info!(%task, output = %output.display(), shards, "starting run");

    let command = cli.command;
    let summary = {
        let output = output.clone();
        tokio::task::spawn_blocking(move || execute(&analyzer, command, &output, cli.quiet)).await??
    };

    if let Some(path) = &cli.summary_json {
        write_summary_json(&summary, path)?;
        info!(path = %path.display(), "summary written");
    }

    if !cli.quiet {
        let report = format!("{}\n\nOutput: {}", summary.detailed_summary(), output.display());
        if to_stdout {
            eprintln!("{}", report);
        } else {
            println!("{}", report);
        }
    }

    Ok(())
}

/// Fold command-line settings over the loaded configuration
pub fn apply_overrides(config: &mut StreamConfig, overrides: &Overrides) -> Result<()> {
    if let Some(minutes) = overrides.window_minutes {
        config.window.window_minutes = minutes;
    }
    if let Some(minutes) = overrides.granularity_minutes {
        config.window.granularity_minutes = minutes;
    }
    if let Some(k) = overrides.std_multiplier {
        config.outliers.std_multiplier = k;
    }
    if let Some(min_history) = overrides.min_history {
        config.outliers.min_history = min_history;
    }
    if let Some(width) = overrides.width {
        config.sketch.width = width;
    }
    if let Some(depth) = overrides.depth {
        config.sketch.depth = depth;
        config.sketch.seeds = None;
    }
    if !overrides.seeds.is_empty() {
        config.sketch.seeds = Some(overrides.seeds.clone());
    }
    if let Some(low) = overrides.low {
        config.buckets.low = low;
    }
    if let Some(high) = overrides.high {
        config.buckets.high = high;
    }
    if let Some(step) = overrides.step {
        config.buckets.step = step;
    }
    if let Some(sentinel) = overrides.sentinel {
        config.records.sentinel = sentinel;
    }
    if let Some(field) = &overrides.field {
        config.records.value_field = field.parse()?;
    }
    if let Some(clock) = &overrides.clock {
        config.records.clock = clock.parse()?;
    }
    Ok(())
}

impl Commands {
    pub fn task(&self) -> Task {
        match self {
            Commands::HourlyMean { .. } => Task::HourlyMean,
            Commands::StationMax { .. } => Task::StationMax,
            Commands::Outliers { .. } => Task::Outliers,
            Commands::Count { .. } => Task::Count,
        }
    }

    /// The input that names the default output file
    pub fn primary_input(&self) -> &Path {
        match self {
            Commands::HourlyMean { input }
            | Commands::Outliers { input }
            | Commands::Count { input } => input,
            Commands::StationMax { input } => input
                .first()
                .map_or(Path::new("stations"), |p| p.as_path()),
        }
    }
}

/// Run one analysis to completion on the current thread
fn execute(
    analyzer: &StreamAnalyzer,
    command: Commands,
    output: &Path,
    quiet: bool,
) -> Result<RunSummary> {
    let task = command.task();
    let mut writer = ResultWriter::open(output)?;
    let progress = ProgressReporter::new_spinner(&format!("Running {}", task), quiet);
    let reader = RecordReader::new();

    let summary = match command {
        Commands::HourlyMean { input } => {
            let records = reader.stream_records(&input)?;
            analyzer.hourly_mean(records, Some(&progress), |row| writer.write_row(&row))?
        }
        Commands::StationMax { input } => {
            let tuples = SynchronizedReader::open(&input)?;
            analyzer.station_max(input.len(), tuples, Some(&progress), |row| {
                writer.write_row(&row)
            })?
        }
        Commands::Outliers { input } => {
            let records = reader.stream_records(&input)?;
            analyzer.outliers(records, Some(&progress), |row| writer.write_row(&row))?
        }
        Commands::Count { input } => {
            let records = reader.stream_records(&input)?;
            let (rows, summary) = analyzer.count(records, Some(&progress))?;
            writer.write_rows(&rows)?;
            summary
        }
    };

    writer.flush()?;
    progress.finish_with_message(&summary.summary());
    Ok(summary)
}
