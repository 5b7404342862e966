/// Number of whitespace-separated columns in a sub-hourly station record
pub const FIELD_COUNT: usize = 23;

/// Reserved reading meaning "value unavailable"
pub const DEFAULT_SENTINEL: f64 = -9999.0;

/// Windowing defaults (minutes)
pub const DEFAULT_WINDOW_MINUTES: u32 = 60;
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 5;

/// Outlier detection defaults
pub const DEFAULT_STD_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_MIN_HISTORY: u64 = 1;

/// Variance magnitudes at or below this are treated as exactly zero
pub const VARIANCE_EPSILON: f64 = 1.0e-16;

/// Count-Min Sketch defaults
pub const DEFAULT_SKETCH_WIDTH: usize = 4;
pub const DEFAULT_SKETCH_DEPTH: usize = 5;
pub const SEED_MULTIPLIER: u64 = 0x9e37_79b9_7f4a_7c15;

/// Bucketing defaults (degrees Celsius)
pub const DEFAULT_BUCKET_LOW: f64 = -10.0;
pub const DEFAULT_BUCKET_HIGH: f64 = 30.0;
pub const DEFAULT_BUCKET_STEP: f64 = 5.0;

/// Tolerance for deciding that a bucket interval divides evenly by its step
pub const DIVISIBILITY_TOLERANCE: f64 = 1.0e-9;

/// Upper limit on interior buckets, keeping B + 2 well inside `usize`
pub const MAX_BUCKETS: usize = u32::MAX as usize;

/// Date and time layouts used by the record files
pub const DATE_FORMAT: &str = "%Y%m%d";
pub const TIME_FORMAT: &str = "%H%M";
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const DEFAULT_SHARD_CHUNK_SIZE: usize = 8192;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "WSP";

/// Directory that receives generated output files
pub const OUTPUT_DIR: &str = "output";
