//! Count-Min Sketch over bucketed readings
//!
//! The sketch keeps a `depth x width` counter table. Each row hashes the
//! fixed-width encoding of a bucket index with its own seed to pick a
//! column; ingest bumps one cell per row and a query takes the row minimum.

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::{ProcessingError, Result};
use crate::sketches::bucketing::{BucketKey, Bucketing};
use crate::traits::{Accumulator, FrequencyTable};
use crate::utils::constants::SEED_MULTIPLIER;

/// Count-Min Sketch for bucket frequencies
///
/// Guarantees, for every bucket:
/// - `true_count <= estimate`
/// - `estimate <= true_count + ε * N` with probability at least `1 - δ`,
///   where `ε = e / width`, `δ = e^-depth` and `N` is the total count
///
/// # Example
///
/// ```
/// use weather_stream_processor::sketches::{Bucketing, CountMinSketch};
/// use weather_stream_processor::traits::Accumulator;
///
/// let bucketing = Bucketing::new(-10.0, 30.0, 5.0).unwrap();
/// let mut cms = CountMinSketch::new(64, 4, bucketing, Some(-9999.0)).unwrap();
///
/// cms.ingest(12.3);
/// cms.ingest(14.9);
/// cms.ingest(-9999.0); // sentinel, ignored
///
/// assert!(cms.query(&11.0) >= 2);
/// ```
#[derive(Clone, Debug)]
pub struct CountMinSketch {
    /// Columns per row
    width: usize,
    /// Rows, one per hash function
    depth: usize,
    /// Counter table, `depth` rows of `width` cells
    table: Vec<Vec<u64>>,
    /// One seed per row
    seeds: Vec<u64>,
    bucketing: Bucketing,
    sentinel: Option<f64>,
    /// Values counted
    total_count: u64,
    /// Sentinel or NaN values passed over
    skipped: u64,
}

impl CountMinSketch {
    /// Create a sketch with deterministic default seeds
    pub fn new(
        width: usize,
        depth: usize,
        bucketing: Bucketing,
        sentinel: Option<f64>,
    ) -> Result<Self> {
        Self::with_seeds(width, default_seeds(depth), bucketing, sentinel)
    }

    /// Create a sketch with caller-supplied seeds; depth is the seed count
    pub fn with_seeds(
        width: usize,
        seeds: Vec<u64>,
        bucketing: Bucketing,
        sentinel: Option<f64>,
    ) -> Result<Self> {
        if width == 0 {
            return Err(ProcessingError::Config(
                "Sketch width must be positive".to_string(),
            ));
        }
        if seeds.is_empty() {
            return Err(ProcessingError::Config(
                "Sketch depth must be positive".to_string(),
            ));
        }
        for (i, seed) in seeds.iter().enumerate() {
            if seeds[..i].contains(seed) {
                return Err(ProcessingError::Config(format!(
                    "Sketch seeds must be distinct; {} appears more than once",
                    seed
                )));
            }
        }

        let depth = seeds.len();
        Ok(Self {
            width,
            depth,
            table: vec![vec![0u64; width]; depth],
            seeds,
            bucketing,
            sentinel,
            total_count: 0,
            skipped: 0,
        })
    }

    /// Create a sketch sized for the given error parameters
    ///
    /// * `epsilon` - Maximum overcount as a fraction of the total (e.g. 0.01)
    /// * `delta` - Probability of exceeding that bound (e.g. 0.001)
    pub fn with_error_rate(
        epsilon: f64,
        delta: f64,
        bucketing: Bucketing,
        sentinel: Option<f64>,
    ) -> Result<Self> {
        if !(epsilon > 0.0 && epsilon < 1.0) || !(delta > 0.0 && delta < 1.0) {
            return Err(ProcessingError::Config(format!(
                "Sketch epsilon and delta must lie in (0, 1), got {} and {}",
                epsilon, delta
            )));
        }

        // width = ceil(e / epsilon), depth = ceil(ln(1 / delta))
        let width = (std::f64::consts::E / epsilon).ceil() as usize;
        let depth = (1.0 / delta).ln().ceil() as usize;
        Self::new(width, depth, bucketing, sentinel)
    }

    /// Same shape, seeds and bucketing, all counters zero
    pub fn empty_like(&self) -> Self {
        Self {
            table: vec![vec![0u64; self.width]; self.depth],
            total_count: 0,
            skipped: 0,
            ..self.clone()
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    pub fn bucketing(&self) -> &Bucketing {
        &self.bucketing
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn column(&self, key: &BucketKey, seed: u64) -> usize {
        (xxh3_64_with_seed(key.as_bytes(), seed) % self.width as u64) as usize
    }

    fn increment(&mut self, bucket: usize) {
        let key = self.bucketing.key(bucket);
        for row in 0..self.depth {
            let col = self.column(&key, self.seeds[row]);
            self.table[row][col] = self.table[row][col].saturating_add(1);
        }
    }

    /// Minimum over the rows for a bucket index
    pub fn estimate_bucket(&self, bucket: usize) -> u64 {
        let key = self.bucketing.key(bucket);
        self.seeds
            .iter()
            .zip(self.table.iter())
            .map(|(&seed, row)| row[self.column(&key, seed)])
            .min()
            .unwrap_or(0)
    }

    /// Theoretical additive error bound (ε * total_count)
    pub fn error_bound(&self) -> u64 {
        let epsilon = std::f64::consts::E / self.width as f64;
        (epsilon * self.total_count as f64) as u64
    }

    /// Add another sketch's counters into this one
    ///
    /// Both must share width, seeds and bucketing.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.width != other.width || self.seeds != other.seeds {
            return Err(ProcessingError::Config(format!(
                "Cannot merge sketches: {}x{} vs {}x{} or differing seeds",
                self.depth, self.width, other.depth, other.width
            )));
        }
        if self.bucketing != other.bucketing {
            return Err(ProcessingError::Config(
                "Cannot merge sketches with different bucketing".to_string(),
            ));
        }

        for (row, other_row) in self.table.iter_mut().zip(other.table.iter()) {
            for (cell, &other_cell) in row.iter_mut().zip(other_row.iter()) {
                *cell = cell.saturating_add(other_cell);
            }
        }
        self.total_count += other.total_count;
        self.skipped += other.skipped;

        Ok(())
    }

    /// Memory used by the counter table and seeds
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.depth * self.width * std::mem::size_of::<u64>()
            + self.seeds.len() * std::mem::size_of::<u64>()
    }
}

/// Deterministic, distinct seeds for `depth` rows
pub fn default_seeds(depth: usize) -> Vec<u64> {
    (0..depth as u64)
        .map(|i| (i + 1).wrapping_mul(SEED_MULTIPLIER))
        .collect()
}

impl Accumulator for CountMinSketch {
    type Output = ();
    type Key = f64;
    type Estimate = u64;

    fn ingest(&mut self, value: f64) {
        if value.is_nan() || self.sentinel == Some(value) {
            self.skipped += 1;
            return;
        }

        let bucket = self.bucketing.bucket(value);
        self.increment(bucket);
        self.total_count += 1;
    }

    fn query(&self, value: &f64) -> u64 {
        self.estimate_bucket(self.bucketing.bucket(*value))
    }
}

impl FrequencyTable for CountMinSketch {
    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn query_bucket(&self, bucket: usize) -> u64 {
        self.estimate_bucket(bucket)
    }
}
