use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::datetime::output_format;

/// Mean of one full window, stamped with the window's first record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowMean {
    #[serde(with = "output_format")]
    pub timestamp: NaiveDateTime,
    pub mean: f64,
}

impl WindowMean {
    pub fn as_tuple(&self) -> (NaiveDateTime, f64) {
        (self.timestamp, self.mean)
    }
}

/// Station whose window maximum was largest for one synchronized window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationMax {
    #[serde(with = "output_format")]
    pub timestamp: NaiveDateTime,
    /// 1-based position of the winning stream
    pub station_index: usize,
    /// The winning window maximum (may be the sentinel)
    pub max_value: f64,
}

impl StationMax {
    pub fn as_tuple(&self) -> (NaiveDateTime, usize) {
        (self.timestamp, self.station_index)
    }
}

/// Per-record outlier decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFlag {
    #[serde(with = "output_format")]
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub mean_before: f64,
    pub std_before: f64,
    pub is_outlier: bool,
    /// The value was the sentinel and did not update the running statistics
    pub missing: bool,
}

impl OutlierFlag {
    pub fn as_tuple(&self) -> ((NaiveDateTime, f64), bool) {
        ((self.timestamp, self.value), self.is_outlier)
    }
}

/// Approximate and exact count of one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: usize,
    pub label: String,
    pub sketch_estimate: u64,
    pub exact_count: u64,
}

impl BucketCount {
    pub fn overestimate(&self) -> u64 {
        self.sketch_estimate.saturating_sub(self.exact_count)
    }
}
