//! Layered run configuration
//!
//! Built-in defaults, then an optional TOML file, then `WSP__`-prefixed
//! environment variables (`WSP__WINDOW__WINDOW_MINUTES=30`). Command-line
//! flags are applied last by the CLI.

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::Result;
use crate::models::{Clock, Field};
use crate::processors::WindowSpec;
use crate::sketches::{default_seeds, Bucketing};
use crate::utils::constants::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StreamConfig {
    #[serde(default)]
    #[validate(nested)]
    pub window: WindowConfig,

    #[serde(default)]
    #[validate(nested)]
    pub outliers: OutlierConfig,

    #[serde(default)]
    #[validate(nested)]
    pub sketch: SketchConfig,

    #[serde(default)]
    pub buckets: BucketConfig,

    #[serde(default)]
    pub records: RecordConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WindowConfig {
    #[validate(range(min = 1))]
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,

    #[validate(range(min = 1))]
    #[serde(default = "default_granularity_minutes")]
    pub granularity_minutes: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
        }
    }
}

fn default_window_minutes() -> u32 {
    DEFAULT_WINDOW_MINUTES
}

fn default_granularity_minutes() -> u32 {
    DEFAULT_GRANULARITY_MINUTES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OutlierConfig {
    #[validate(range(min = 0.0))]
    #[serde(default = "default_std_multiplier")]
    pub std_multiplier: f64,

    #[serde(default = "default_min_history")]
    pub min_history: u64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            std_multiplier: DEFAULT_STD_MULTIPLIER,
            min_history: DEFAULT_MIN_HISTORY,
        }
    }
}

fn default_std_multiplier() -> f64 {
    DEFAULT_STD_MULTIPLIER
}

fn default_min_history() -> u64 {
    DEFAULT_MIN_HISTORY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SketchConfig {
    #[validate(range(min = 1))]
    #[serde(default = "default_sketch_width")]
    pub width: usize,

    #[validate(range(min = 1))]
    #[serde(default = "default_sketch_depth")]
    pub depth: usize,

    /// Explicit per-row hash seeds; when set, their count replaces `depth`
    #[validate(length(min = 1))]
    #[serde(default)]
    pub seeds: Option<Vec<u64>>,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SKETCH_WIDTH,
            depth: DEFAULT_SKETCH_DEPTH,
            seeds: None,
        }
    }
}

impl SketchConfig {
    pub fn resolved_seeds(&self) -> Vec<u64> {
        self.seeds
            .clone()
            .unwrap_or_else(|| default_seeds(self.depth))
    }
}

fn default_sketch_width() -> usize {
    DEFAULT_SKETCH_WIDTH
}

fn default_sketch_depth() -> usize {
    DEFAULT_SKETCH_DEPTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    #[serde(default = "default_bucket_low")]
    pub low: f64,

    #[serde(default = "default_bucket_high")]
    pub high: f64,

    #[serde(default = "default_bucket_step")]
    pub step: f64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            low: DEFAULT_BUCKET_LOW,
            high: DEFAULT_BUCKET_HIGH,
            step: DEFAULT_BUCKET_STEP,
        }
    }
}

fn default_bucket_low() -> f64 {
    DEFAULT_BUCKET_LOW
}

fn default_bucket_high() -> f64 {
    DEFAULT_BUCKET_HIGH
}

fn default_bucket_step() -> f64 {
    DEFAULT_BUCKET_STEP
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default = "default_sentinel")]
    pub sentinel: f64,

    #[serde(default = "default_value_field")]
    pub value_field: Field,

    #[serde(default)]
    pub clock: Clock,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL,
            value_field: default_value_field(),
            clock: Clock::default(),
        }
    }
}

fn default_sentinel() -> f64 {
    DEFAULT_SENTINEL
}

fn default_value_field() -> Field {
    Field::AirTemperature
}

impl StreamConfig {
    /// Defaults, then `path` if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Window size in records; fails when the window is not a multiple of the granularity
    pub fn window_spec(&self) -> Result<WindowSpec> {
        WindowSpec::new(self.window.window_minutes, self.window.granularity_minutes)
    }

    /// Bucket layout; fails when the interval is not a multiple of the step
    pub fn bucketing(&self) -> Result<Bucketing> {
        Bucketing::new(self.buckets.low, self.buckets.high, self.buckets.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.window.window_minutes, 60);
        assert_eq!(config.window.granularity_minutes, 5);
        assert_eq!(config.outliers.std_multiplier, 3.0);
        assert_eq!(config.buckets.low, -10.0);
        assert_eq!(config.buckets.high, 30.0);
        assert_eq!(config.buckets.step, 5.0);
        assert_eq!(config.records.sentinel, -9999.0);
        assert_eq!(config.records.value_field, Field::AirTemperature);
        assert_eq!(config.window_spec().unwrap().size(), 12);
        assert_eq!(config.bucketing().unwrap().bucket_count(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[window]")?;
        writeln!(file, "window_minutes = 30")?;
        writeln!(file, "[sketch]")?;
        writeln!(file, "width = 64")?;
        writeln!(file, "seeds = [7, 8, 9]")?;
        writeln!(file, "[records]")?;
        writeln!(file, "value_field = \"SURFACE_TEMPERATURE\"")?;
        writeln!(file, "clock = \"local\"")?;
        file.flush()?;

        let config = StreamConfig::load(Some(file.path()))?;
        assert_eq!(config.window.window_minutes, 30);
        assert_eq!(config.window.granularity_minutes, 5);
        assert_eq!(config.sketch.width, 64);
        assert_eq!(config.sketch.resolved_seeds(), vec![7, 8, 9]);
        assert_eq!(config.records.value_field, Field::SurfaceTemperature);
        assert_eq!(config.records.clock, Clock::Local);
        assert_eq!(config.window_spec()?.size(), 6);

        Ok(())
    }

    #[test]
    fn test_load_field_with_digits() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[records]")?;
        writeln!(file, "value_field = \"WIND_1_5\"")?;
        file.flush()?;

        let config = StreamConfig::load(Some(file.path()))?;
        assert_eq!(config.records.value_field, Field::Wind1_5);

        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = StreamConfig::default();
        config.sketch.width = 0;
        assert!(config.validate().is_err());

        let mut config = StreamConfig::default();
        config.window.granularity_minutes = 7;
        assert!(config.validate().is_ok());
        assert!(config.window_spec().is_err());

        let mut config = StreamConfig::default();
        config.buckets.step = 3.0;
        assert!(config.bucketing().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(StreamConfig::load(Some(Path::new("/nonexistent/wsp.toml"))).is_err());
    }
}
