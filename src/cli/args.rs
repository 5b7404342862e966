use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "weather-stream")]
#[command(about = "One-pass streaming analyses over sub-hourly weather station records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Output CSV path, '-' for stdout [default: output/{input}-{task}-{YYMMDD}.csv]"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, global = true, help = "Write the run summary as JSON to this path")]
    pub summary_json: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress and summary output")]
    pub quiet: bool,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mean of the value field over each full window
    HourlyMean {
        #[arg(short, long, help = "Station record file")]
        input: PathBuf,
    },

    /// Which station holds the largest window maximum, per window
    StationMax {
        #[arg(
            short,
            long,
            num_args = 2..,
            required = true,
            help = "Time-aligned station record files (at least two)"
        )]
        input: Vec<PathBuf>,
    },

    /// Flag readings far from the running mean
    Outliers {
        #[arg(short, long, help = "Station record file")]
        input: PathBuf,
    },

    /// Approximate (Count-Min Sketch) and exact bucket counts
    Count {
        #[arg(short, long, help = "Station record file")]
        input: PathBuf,
    },
}

/// Per-setting overrides applied on top of file and environment configuration
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    #[arg(long, global = true)]
    pub window_minutes: Option<u32>,

    #[arg(long, global = true)]
    pub granularity_minutes: Option<u32>,

    #[arg(long, global = true, help = "Outlier threshold in standard deviations")]
    pub std_multiplier: Option<f64>,

    #[arg(long, global = true)]
    pub min_history: Option<u64>,

    #[arg(long, global = true, help = "Sketch columns per row")]
    pub width: Option<usize>,

    #[arg(long, global = true, help = "Sketch rows (ignored when seeds are given)")]
    pub depth: Option<usize>,

    #[arg(long = "seed", global = true, help = "Sketch row seed (repeatable)")]
    pub seeds: Vec<u64>,

    #[arg(long, global = true, allow_hyphen_values = true)]
    pub low: Option<f64>,

    #[arg(long, global = true, allow_hyphen_values = true)]
    pub high: Option<f64>,

    #[arg(long, global = true)]
    pub step: Option<f64>,

    #[arg(long, global = true, allow_hyphen_values = true)]
    pub sentinel: Option<f64>,

    #[arg(long, global = true, help = "Column to analyse, e.g. AIR_TEMPERATURE")]
    pub field: Option<String>,

    #[arg(long, global = true, help = "Timestamp columns: utc or local")]
    pub clock: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Workers for count ingestion (0 = all CPUs) [default: 1]"
    )]
    pub shards: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_station_max() {
        let cli = Cli::try_parse_from([
            "weather-stream",
            "station-max",
            "--input",
            "a.txt",
            "b.txt",
            "c.txt",
            "--window-minutes",
            "30",
        ])
        .unwrap();

        match cli.command {
            Commands::StationMax { input } => assert_eq!(input.len(), 3),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.overrides.window_minutes, Some(30));
    }

    #[test]
    fn test_station_max_needs_two_inputs() {
        assert!(Cli::try_parse_from(["weather-stream", "station-max", "--input", "a.txt"]).is_err());
    }

    #[test]
    fn test_repeatable_seeds_and_negative_values() {
        let cli = Cli::try_parse_from([
            "weather-stream",
            "count",
            "-i",
            "a.txt",
            "--seed",
            "1",
            "--seed",
            "2",
            "--low",
            "-20",
            "--quiet",
        ])
        .unwrap();

        assert_eq!(cli.overrides.seeds, vec![1, 2]);
        assert_eq!(cli.overrides.low, Some(-20.0));
        assert!(cli.quiet);
    }
}
