use std::collections::BTreeMap;

use crate::error::{ProcessingError, Result};
use crate::sketches::bucketing::Bucketing;
use crate::traits::{Accumulator, FrequencyTable};

/// Exact bucket counts, the ground truth a sketch is compared against
///
/// Uses the same bucketing rule and sentinel skip as [`CountMinSketch`](super::CountMinSketch).
#[derive(Debug, Clone)]
pub struct ExactCounter {
    bucketing: Bucketing,
    sentinel: Option<f64>,
    counts: BTreeMap<usize, u64>,
    total_count: u64,
    skipped: u64,
}

impl ExactCounter {
    pub fn new(bucketing: Bucketing, sentinel: Option<f64>) -> Self {
        Self {
            bucketing,
            sentinel,
            counts: BTreeMap::new(),
            total_count: 0,
            skipped: 0,
        }
    }

    /// Same bucketing and sentinel, no counts
    pub fn empty_like(&self) -> Self {
        Self::new(self.bucketing, self.sentinel)
    }

    pub fn bucketing(&self) -> &Bucketing {
        &self.bucketing
    }

    /// Non-empty buckets and their counts, ascending by bucket
    pub fn counts(&self) -> &BTreeMap<usize, u64> {
        &self.counts
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.bucketing != other.bucketing {
            return Err(ProcessingError::Config(
                "Cannot merge counters with different bucketing".to_string(),
            ));
        }

        for (&bucket, &count) in &other.counts {
            *self.counts.entry(bucket).or_insert(0) += count;
        }
        self.total_count += other.total_count;
        self.skipped += other.skipped;

        Ok(())
    }
}

impl Accumulator for ExactCounter {
    type Output = ();
    type Key = f64;
    type Estimate = u64;

    fn ingest(&mut self, value: f64) {
        if value.is_nan() || self.sentinel == Some(value) {
            self.skipped += 1;
            return;
        }

        let bucket = self.bucketing.bucket(value);
        *self.counts.entry(bucket).or_insert(0) += 1;
        self.total_count += 1;
    }

    fn query(&self, value: &f64) -> u64 {
        self.query_bucket(self.bucketing.bucket(*value))
    }
}

impl FrequencyTable for ExactCounter {
    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn query_bucket(&self, bucket: usize) -> u64 {
        self.counts.get(&bucket).copied().unwrap_or(0)
    }
}
