//! Streaming mean and standard deviation with pre-update reporting

use serde::{Deserialize, Serialize};

use crate::traits::Accumulator;
use crate::utils::constants::VARIANCE_EPSILON;

/// Mean and standard deviation at one point of the stream
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

/// Running (count, mean, variance) triple
///
/// Every ingest returns the statistics as they stood *before* the value was
/// absorbed, so a value never influences the bound it is judged against.
/// Sentinel values are not absorbed but still receive the current pair.
///
/// ```
/// use weather_stream_processor::processors::RunningStats;
/// use weather_stream_processor::traits::Accumulator;
///
/// let mut stats = RunningStats::new(None);
/// let first = stats.ingest(2.0);
/// assert_eq!((first.mean, first.std), (0.0, 0.0));
///
/// stats.ingest(4.0);
/// assert_eq!(stats.mean(), 3.0);
/// assert_eq!(stats.std_dev(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    variance: f64,
    sentinel: Option<f64>,
    skipped: u64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RunningStats {
    pub fn new(sentinel: Option<f64>) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            variance: 0.0,
            sentinel,
            skipped: 0,
        }
    }

    fn is_sentinel(&self, value: f64) -> bool {
        self.sentinel == Some(value)
    }

    /// Values absorbed so far
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sentinel values passed over
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, possibly slightly negative from cancellation
    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        clamped_std(self.variance)
    }

    pub fn current(&self) -> MeanStd {
        MeanStd {
            mean: self.mean,
            std: self.std_dev(),
        }
    }
}

fn clamped_std(variance: f64) -> f64 {
    if variance.abs() <= VARIANCE_EPSILON {
        0.0
    } else {
        variance.max(0.0).sqrt()
    }
}

impl Accumulator for RunningStats {
    type Output = MeanStd;
    type Key = ();
    type Estimate = MeanStd;

    fn ingest(&mut self, value: f64) -> MeanStd {
        let before = self.current();

        if self.is_sentinel(value) {
            self.skipped += 1;
            return before;
        }

        let n = self.count as f64;
        let mean = (self.mean * n + value) / (n + 1.0);
        let variance =
            ((self.variance + self.mean * self.mean) * n + value * value) / (n + 1.0) - mean * mean;

        self.mean = mean;
        self.variance = variance;
        self.count += 1;

        before
    }

    fn query(&self, _key: &()) -> MeanStd {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::constants::DEFAULT_SENTINEL;

    fn batch_mean_variance(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, variance)
    }

    fn assert_close(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= 1e-9 * scale,
            "{} != {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_first_value_sees_zero_baseline() {
        let mut stats = RunningStats::new(Some(DEFAULT_SENTINEL));
        let before = stats.ingest(17.5);
        assert_eq!(before, MeanStd { mean: 0.0, std: 0.0 });
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.mean(), 17.5);
    }

    #[test]
    fn test_reports_state_before_update() {
        let mut stats = RunningStats::new(None);
        stats.ingest(1.0);
        stats.ingest(3.0);

        let expected = stats.current();
        let before = stats.ingest(100.0);
        assert_eq!(before, expected);
        assert_eq!(before.mean, 2.0);
        assert_eq!(before.std, 1.0);
    }

    #[test]
    fn test_matches_batch_formulas() {
        let values: Vec<f64> = (0..500)
            .map(|i| ((i * 37) % 101) as f64 * 0.25 - 7.0)
            .collect();

        let mut stats = RunningStats::new(Some(DEFAULT_SENTINEL));
        for &v in &values {
            stats.ingest(v);
        }

        let (mean, variance) = batch_mean_variance(&values);
        assert_close(stats.mean(), mean);
        assert_close(stats.variance(), variance);
        assert_close(stats.std_dev(), variance.sqrt());
    }

    #[test]
    fn test_sentinel_is_skipped_but_answered() {
        let mut stats = RunningStats::new(Some(DEFAULT_SENTINEL));
        stats.ingest(10.0);
        stats.ingest(20.0);

        let before = stats.ingest(DEFAULT_SENTINEL);
        assert_eq!(before.mean, 15.0);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.mean(), 15.0);
    }

    #[test]
    fn test_constant_stream_has_zero_std() {
        let mut stats = RunningStats::new(None);
        for _ in 0..1000 {
            stats.ingest(1.0);
        }
        assert_eq!(stats.std_dev(), 0.0);

        let mut inexact = RunningStats::new(None);
        for _ in 0..1000 {
            inexact.ingest(0.1);
        }
        assert!(!inexact.std_dev().is_nan());
        assert!(inexact.std_dev() < 1e-6);
    }

    #[test]
    fn test_negative_variance_is_clamped() {
        assert_eq!(clamped_std(-1e-17), 0.0);
        assert_eq!(clamped_std(-1e-10), 0.0);
        assert_eq!(clamped_std(4.0), 2.0);
    }

    #[test]
    fn test_query_reports_current_state() {
        let mut stats = RunningStats::default();
        stats.ingest(2.0);
        stats.ingest(4.0);
        assert_eq!(stats.query(&()), MeanStd { mean: 3.0, std: 1.0 });
    }
}
