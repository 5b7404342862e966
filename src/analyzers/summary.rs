use serde::{Deserialize, Serialize};
use std::fmt;

/// The four streaming analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    HourlyMean,
    StationMax,
    Outliers,
    Count,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::HourlyMean => "hourly-mean",
            Task::StationMax => "station-max",
            Task::Outliers => "outliers",
            Task::Count => "count",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one run read, emitted and skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub task: Task,
    /// Records (or synchronized tuples, for station-max) consumed
    pub records_read: usize,
    /// Output rows produced
    pub rows_emitted: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    /// Records in the incomplete trailing window, never emitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_dropped: Option<usize>,
    /// Windows whose every reading was the sentinel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_windows: Option<usize>,
    /// Argmax windows won by a sentinel maximum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentinel_wins: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outliers_flagged: Option<usize>,
    /// Sentinel (or NaN) readings left out of the statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentinels_skipped: Option<u64>,
    /// Values counted by the frequency tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// ε·N over-count bound of the sketch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_bound: Option<u64>,
    /// Largest observed sketch over-estimate across buckets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_overestimate: Option<u64>,
}

impl RunSummary {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            records_read: 0,
            rows_emitted: 0,
            window_size: None,
            trailing_dropped: None,
            missing_windows: None,
            sentinel_wins: None,
            outliers_flagged: None,
            sentinels_skipped: None,
            total_count: None,
            error_bound: None,
            max_overestimate: None,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Task {}: {} records read, {} rows emitted",
            self.task, self.records_read, self.rows_emitted
        )
    }

    pub fn detailed_summary(&self) -> String {
        let mut lines = vec![self.summary()];

        if let Some(size) = self.window_size {
            lines.push(format!("- Window size: {} records", size));
        }
        if let Some(dropped) = self.trailing_dropped {
            lines.push(format!("- Trailing records dropped: {}", dropped));
        }
        if let Some(missing) = self.missing_windows {
            lines.push(format!("- All-missing windows: {}", missing));
        }
        if let Some(wins) = self.sentinel_wins {
            lines.push(format!("- Windows won by a missing value: {}", wins));
        }
        if let Some(outliers) = self.outliers_flagged {
            let rate = if self.records_read > 0 {
                outliers as f64 / self.records_read as f64 * 100.0
            } else {
                0.0
            };
            lines.push(format!("- Outliers flagged: {} ({:.2}%)", outliers, rate));
        }
        if let Some(skipped) = self.sentinels_skipped {
            lines.push(format!("- Missing readings skipped: {}", skipped));
        }
        if let Some(total) = self.total_count {
            lines.push(format!("- Values counted: {}", total));
        }
        if let (Some(bound), Some(over)) = (self.error_bound, self.max_overestimate) {
            lines.push(format!(
                "- Sketch over-estimate: max {} (bound {})",
                over, bound
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_only_relevant_fields() {
        let mut summary = RunSummary::new(Task::Outliers);
        summary.records_read = 5;
        summary.rows_emitted = 5;
        summary.outliers_flagged = Some(1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["task"], "outliers");
        assert_eq!(json["outliers_flagged"], 1);
        assert!(json.get("error_bound").is_none());

        let text = summary.detailed_summary();
        assert!(text.contains("Outliers flagged: 1 (20.00%)"));
    }

    #[test]
    fn test_task_names() {
        assert_eq!(Task::HourlyMean.to_string(), "hourly-mean");
        assert_eq!(
            serde_json::to_string(&Task::StationMax).unwrap(),
            "\"station-max\""
        );
    }
}
