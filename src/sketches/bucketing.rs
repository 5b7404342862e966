use serde::Serialize;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DIVISIBILITY_TOLERANCE, MAX_BUCKETS};

/// Fixed-width big-endian encoding of a bucket index, used as a hash key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketKey {
    bytes: [u8; 8],
    width: usize,
}

impl BucketKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[8 - self.width..]
    }
}

/// Maps values onto B + 2 buckets over `[low, high)` in steps of `step`
///
/// Bucket 0 holds everything below `low`, bucket B + 1 everything at or
/// above `high`; buckets 1..=B are inclusive-low, exclusive-high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucketing {
    low: f64,
    high: f64,
    step: f64,
    interior: usize,
    key_width: usize,
}

impl Bucketing {
    /// `(high - low) / step` must be a whole number of buckets, at most
    /// `MAX_BUCKETS`. Divisibility is judged within a relative tolerance of
    /// `DIVISIBILITY_TOLERANCE`, so `[-1, 1)` in steps of `0.1` is accepted
    /// even though `2.0 % 0.1` is not exactly zero in floating point.
    pub fn new(low: f64, high: f64, step: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && step.is_finite()) {
            return Err(ProcessingError::Config(
                "Bucket bounds and step must be finite".to_string(),
            ));
        }
        if step <= 0.0 {
            return Err(ProcessingError::Config(format!(
                "Bucket step must be positive, got {}",
                step
            )));
        }
        if high <= low {
            return Err(ProcessingError::Config(format!(
                "Bucket high bound {} must exceed low bound {}",
                high, low
            )));
        }

        let ratio = (high - low) / step;
        if !ratio.is_finite() || ratio.round() > MAX_BUCKETS as f64 {
            return Err(ProcessingError::Config(format!(
                "Bucket interval [{}, {}) with step {} exceeds {} buckets",
                low, high, step, MAX_BUCKETS
            )));
        }

        let rounded = ratio.round();
        if rounded < 1.0 || (ratio - rounded).abs() > DIVISIBILITY_TOLERANCE * rounded {
            return Err(ProcessingError::Config(format!(
                "Bucket interval [{}, {}) is not divisible by step {}",
                low, high, step
            )));
        }

        let interior = rounded as usize;
        Ok(Self {
            low,
            high,
            step,
            interior,
            key_width: key_width(interior + 2),
        })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of interior buckets (B)
    pub fn interior(&self) -> usize {
        self.interior
    }

    /// Total number of buckets, outer two included (B + 2)
    pub fn bucket_count(&self) -> usize {
        self.interior + 2
    }

    /// Bucket index of a value. NaN lands in bucket 0.
    pub fn bucket(&self, value: f64) -> usize {
        if value.is_nan() || value < self.low {
            0
        } else if value >= self.high {
            self.interior + 1
        } else {
            let offset = ((value - self.low) / self.step).floor() as usize;
            // Rounding just below `high` must not spill into the top bucket.
            offset.min(self.interior - 1) + 1
        }
    }

    pub fn key(&self, bucket: usize) -> BucketKey {
        BucketKey {
            bytes: (bucket as u64).to_be_bytes(),
            width: self.key_width,
        }
    }

    pub fn key_width(&self) -> usize {
        self.key_width
    }

    /// A value that falls inside the bucket
    pub fn representative(&self, bucket: usize) -> f64 {
        let half = self.step / 2.0;
        if bucket == 0 {
            self.low - half
        } else if bucket > self.interior {
            self.high + half
        } else {
            self.low + (bucket - 1) as f64 * self.step + half
        }
    }

    pub fn label(&self, bucket: usize) -> String {
        if bucket == 0 {
            format!("-inf..{}", self.low)
        } else if bucket > self.interior {
            format!("{}..inf", self.high)
        } else {
            let start = self.low + (bucket - 1) as f64 * self.step;
            format!("{}..{}", start, start + self.step)
        }
    }

    pub fn buckets(&self) -> std::ops::RangeInclusive<usize> {
        0..=self.interior + 1
    }
}

/// Bytes needed to encode every index below `count`
fn key_width(count: usize) -> usize {
    let mut width = 1;
    while width < 8 && (count as u128) >= 1u128 << (8 * width) {
        width += 1;
    }
    width
}
