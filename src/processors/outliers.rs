use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{Clock, Field, OutlierFlag, StationRecord};
use crate::processors::running_stats::RunningStats;
use crate::traits::Accumulator;

/// Flags readings more than `k` standard deviations from the running mean
///
/// Each reading is judged against the statistics of the readings before it.
/// Runs per record, at full granularity.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    stats: RunningStats,
    std_multiplier: f64,
    min_history: u64,
    field: Field,
    clock: Clock,
    sentinel: f64,
    outliers: usize,
    checked: usize,
}

impl OutlierDetector {
    /// Waits for one absorbed reading before flagging; `with_min_history(0)`
    /// flags a non-zero first reading against the zero baseline instead.
    pub fn new(std_multiplier: f64, field: Field, clock: Clock, sentinel: f64) -> Result<Self> {
        if !std_multiplier.is_finite() || std_multiplier < 0.0 {
            return Err(ProcessingError::Config(format!(
                "Outlier multiplier must be a non-negative number, got {}",
                std_multiplier
            )));
        }

        Ok(Self {
            stats: RunningStats::new(Some(sentinel)),
            std_multiplier,
            min_history: 1,
            field,
            clock,
            sentinel,
            outliers: 0,
            checked: 0,
        })
    }

    /// Number of absorbed readings required before anything is flagged.
    /// Zero compares every reading, including the first against the empty
    /// zero-mean, zero-std baseline.
    pub fn with_min_history(mut self, min_history: u64) -> Self {
        self.min_history = min_history;
        self
    }

    pub fn push(&mut self, record: &StationRecord) -> Result<OutlierFlag> {
        let timestamp = record.timestamp(self.clock)?;
        let value = record.value(self.field)?;
        Ok(self.check(timestamp, value))
    }

    /// Judge a value against the pre-update statistics, then absorb it
    pub fn check(&mut self, timestamp: NaiveDateTime, value: f64) -> OutlierFlag {
        let history = self.stats.len();
        let before = self.stats.ingest(value);

        let upper = before.mean + self.std_multiplier * before.std;
        let lower = before.mean - self.std_multiplier * before.std;
        let beyond = value > upper || value < lower;
        let is_outlier = beyond && history >= self.min_history;

        self.checked += 1;
        if is_outlier {
            self.outliers += 1;
            debug!(%timestamp, value, mean = before.mean, std = before.std, "outlier");
        }

        OutlierFlag {
            timestamp,
            value,
            mean_before: before.mean,
            std_before: before.std,
            is_outlier,
            missing: value == self.sentinel,
        }
    }

    pub fn outliers(&self) -> usize {
        self.outliers
    }

    pub fn checked(&self) -> usize {
        self.checked
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::tests::sample_line;
    use crate::models::RecordAnnotator;
    use crate::utils::constants::DEFAULT_SENTINEL;
    use crate::utils::datetime::to_timestamp;

    fn detector() -> OutlierDetector {
        OutlierDetector::new(3.0, Field::AirTemperature, Clock::Utc, DEFAULT_SENTINEL).unwrap()
    }

    fn flags(detector: &mut OutlierDetector, values: &[f64]) -> Vec<OutlierFlag> {
        let ts = to_timestamp("20210101", "0000").unwrap();
        values.iter().map(|&v| detector.check(ts, v)).collect()
    }

    #[test]
    fn test_only_jump_after_constant_run_is_flagged() {
        let mut d = detector();
        let out = flags(&mut d, &[1.0, 1.0, 1.0, 1.0, 100.0]);

        let flagged: Vec<bool> = out.iter().map(|f| f.is_outlier).collect();
        assert_eq!(flagged, vec![false, false, false, false, true]);
        assert_eq!(out[4].mean_before, 1.0);
        assert_eq!(out[4].std_before, 0.0);
        assert_eq!(d.outliers(), 1);
    }

    #[test]
    fn test_first_value_uses_zero_baseline() {
        let mut d = detector();
        let first = flags(&mut d, &[12.0])[0];
        assert_eq!(first.mean_before, 0.0);
        assert_eq!(first.std_before, 0.0);
        assert!(!first.is_outlier);

        let mut literal = detector().with_min_history(0);
        let first = flags(&mut literal, &[12.0])[0];
        assert_eq!((first.mean_before, first.std_before), (0.0, 0.0));
        assert!(first.is_outlier);

        let zero = flags(&mut detector().with_min_history(0), &[0.0])[0];
        assert!(!zero.is_outlier);
    }

    #[test]
    fn test_value_within_band_is_not_flagged() {
        let mut d = detector();
        // 12 departs from a zero-spread history; after it the band is 11 +/- 3.
        let out = flags(&mut d, &[10.0, 12.0, 13.0, 9.0, 11.0]);
        assert!(out[1].is_outlier);
        assert!(out[2..].iter().all(|f| !f.is_outlier));
    }

    #[test]
    fn test_low_outlier() {
        let mut d = detector();
        let out = flags(&mut d, &[5.0, 5.0, 5.0, -40.0]);
        assert!(out[3].is_outlier);
    }

    #[test]
    fn test_sentinel_does_not_move_statistics() {
        let mut d = detector();
        let out = flags(&mut d, &[2.0, DEFAULT_SENTINEL, 2.0, 2.0]);

        assert!(out[1].missing);
        assert_eq!(d.stats().len(), 3);
        assert_eq!(out[2].mean_before, 2.0);
        assert_eq!(out[3].std_before, 0.0);
        assert_eq!(d.checked(), 4);
    }

    #[test]
    fn test_push_reads_record_fields() {
        let mut d = detector();
        let record = RecordAnnotator::new()
            .annotate(&sample_line("20210704", "1330", 21.5))
            .unwrap();

        let flag = d.push(&record).unwrap();
        assert_eq!(flag.value, 21.5);
        assert_eq!(flag.timestamp, to_timestamp("20210704", "1330").unwrap());
        assert_eq!(flag.as_tuple(), ((flag.timestamp, 21.5), false));
    }

    #[test]
    fn test_rejects_negative_multiplier() {
        assert!(
            OutlierDetector::new(-1.0, Field::AirTemperature, Clock::Utc, DEFAULT_SENTINEL)
                .is_err()
        );
    }
}
