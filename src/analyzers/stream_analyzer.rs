use tracing::{debug, info};

use crate::analyzers::summary::{RunSummary, Task};
use crate::config::StreamConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{BucketCount, OutlierFlag, StationMax, StationRecord, WindowMean};
use crate::processors::{MultiStreamArgMax, OutlierDetector, WindowedMean};
use crate::sketches::{Bucketing, CountMinSketch, ExactCounter, ShardedIngest};
use crate::traits::{Accumulator, FrequencyTable};
use crate::utils::progress::ProgressReporter;

/// Drives record streams through one analysis each and reports what happened
///
/// Rows are handed to a sink as soon as they are produced, so memory use is
/// bounded by the window size (the count task keeps only its two tables).
#[derive(Debug, Clone)]
pub struct StreamAnalyzer {
    config: StreamConfig,
    shards: usize,
}

impl StreamAnalyzer {
    pub fn new(config: StreamConfig) -> Self {
        Self { config, shards: 1 }
    }

    /// Worker count for frequency-table ingestion; 1 keeps it sequential
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Mean of the value field over each full window
    pub fn hourly_mean<I, F>(
        &self,
        records: I,
        progress: Option<&ProgressReporter>,
        mut sink: F,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<StationRecord>>,
        F: FnMut(WindowMean) -> Result<()>,
    {
        let spec = self.config.window_spec()?;
        let records_config = &self.config.records;
        let mut windowed = WindowedMean::new(
            spec,
            records_config.value_field,
            records_config.clock,
            records_config.sentinel,
        );

        info!(window = spec.size(), field = %records_config.value_field, "computing window means");

        let mut summary = RunSummary::new(Task::HourlyMean);
        for record in records {
            let record = record?;
            summary.records_read += 1;
            tick(progress);

            if let Some(row) = windowed.push(record)? {
                sink(row)?;
                summary.rows_emitted += 1;
            }
        }

        summary.window_size = Some(spec.size());
        summary.trailing_dropped = Some(windowed.pending());
        summary.missing_windows = Some(windowed.missing_windows());

        info!(
            records = summary.records_read,
            windows = summary.rows_emitted,
            "window means complete"
        );
        Ok(summary)
    }

    /// Index of the stream with the largest window maximum, per window
    pub fn station_max<I, F>(
        &self,
        streams: usize,
        tuples: I,
        progress: Option<&ProgressReporter>,
        mut sink: F,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Vec<StationRecord>>>,
        F: FnMut(StationMax) -> Result<()>,
    {
        let spec = self.config.window_spec()?;
        let records_config = &self.config.records;
        let mut argmax = MultiStreamArgMax::new(
            streams,
            spec,
            records_config.value_field,
            records_config.clock,
            records_config.sentinel,
        )?;

        info!(streams, window = spec.size(), "computing station maxima");

        let mut summary = RunSummary::new(Task::StationMax);
        for tuple in tuples {
            let tuple = tuple?;
            summary.records_read += 1;
            tick(progress);

            if let Some(row) = argmax.push(tuple)? {
                sink(row)?;
                summary.rows_emitted += 1;
            }
        }

        summary.window_size = Some(spec.size());
        summary.trailing_dropped = Some(summary.records_read - summary.rows_emitted * spec.size());
        summary.sentinel_wins = Some(argmax.sentinel_wins());

        info!(
            tuples = summary.records_read,
            windows = summary.rows_emitted,
            "station maxima complete"
        );
        Ok(summary)
    }

    /// Per-record outlier flags against the running mean and deviation
    pub fn outliers<I, F>(
        &self,
        records: I,
        progress: Option<&ProgressReporter>,
        mut sink: F,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<StationRecord>>,
        F: FnMut(OutlierFlag) -> Result<()>,
    {
        let records_config = &self.config.records;
        let mut detector = OutlierDetector::new(
            self.config.outliers.std_multiplier,
            records_config.value_field,
            records_config.clock,
            records_config.sentinel,
        )?
        .with_min_history(self.config.outliers.min_history);

        info!(
            k = self.config.outliers.std_multiplier,
            min_history = self.config.outliers.min_history,
            "detecting outliers"
        );

        let mut summary = RunSummary::new(Task::Outliers);
        for record in records {
            let record = record?;
            summary.records_read += 1;
            tick(progress);

            sink(detector.push(&record)?)?;
            summary.rows_emitted += 1;
        }

        summary.outliers_flagged = Some(detector.outliers());
        summary.sentinels_skipped = Some(detector.stats().skipped());

        info!(
            records = summary.records_read,
            outliers = detector.outliers(),
            "outlier detection complete"
        );
        Ok(summary)
    }

    /// Sketch estimate and exact count for every bucket, from one pass
    pub fn count<I>(
        &self,
        records: I,
        progress: Option<&ProgressReporter>,
    ) -> Result<(Vec<BucketCount>, RunSummary)>
    where
        I: IntoIterator<Item = Result<StationRecord>>,
    {
        let bucketing = self.config.bucketing()?;
        let field = self.config.records.value_field;
        let mut sketch = self.build_sketch(bucketing)?;
        let mut exact = ExactCounter::new(bucketing, Some(self.config.records.sentinel));

        let sharded = if self.shards > 1 {
            Some(ShardedIngest::new(self.shards)?)
        } else {
            None
        };

        info!(
            width = sketch.width(),
            depth = sketch.depth(),
            buckets = bucketing.bucket_count(),
            shards = self.shards,
            "counting bucket frequencies"
        );

        let mut summary = RunSummary::new(Task::Count);
        let mut pending = Vec::new();

        for record in records {
            let value = record?.value(field)?;
            summary.records_read += 1;
            tick(progress);

            match &sharded {
                Some(pool) => {
                    pending.push(value);
                    if pending.len() >= pool.chunk_size() {
                        flush(pool, &mut sketch, &mut exact, &mut pending)?;
                    }
                }
                None => {
                    sketch.ingest(value);
                    exact.ingest(value);
                }
            }
        }

        if let Some(pool) = &sharded {
            flush(pool, &mut sketch, &mut exact, &mut pending)?;
        }

        let rows = bucket_rows(&bucketing, &sketch, &exact);
        if let Some(row) = rows.iter().find(|row| row.sketch_estimate < row.exact_count) {
            return Err(ProcessingError::InvalidFormat(format!(
                "sketch under-estimated bucket {}: {} < {}",
                row.label, row.sketch_estimate, row.exact_count
            )));
        }

        summary.rows_emitted = rows.len();
        summary.total_count = Some(exact.total_count());
        summary.sentinels_skipped = Some(exact.skipped());
        summary.error_bound = Some(sketch.error_bound());
        summary.max_overestimate = rows.iter().map(BucketCount::overestimate).max();

        info!(
            values = exact.total_count(),
            error_bound = sketch.error_bound(),
            "bucket counts complete"
        );
        Ok((rows, summary))
    }

    fn build_sketch(&self, bucketing: Bucketing) -> Result<CountMinSketch> {
        let sketch = &self.config.sketch;
        CountMinSketch::with_seeds(
            sketch.width,
            sketch.resolved_seeds(),
            bucketing,
            Some(self.config.records.sentinel),
        )
    }
}

fn tick(progress: Option<&ProgressReporter>) {
    if let Some(progress) = progress {
        progress.increment(1);
    }
}

fn flush(
    pool: &ShardedIngest,
    sketch: &mut CountMinSketch,
    exact: &mut ExactCounter,
    pending: &mut Vec<f64>,
) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    debug!(values = pending.len(), "flushing value batch");
    pool.ingest(sketch, pending)?;
    pool.ingest(exact, pending)?;
    pending.clear();
    Ok(())
}

/// Each bucket queried at its representative value
fn bucket_rows(
    bucketing: &Bucketing,
    sketch: &CountMinSketch,
    exact: &ExactCounter,
) -> Vec<BucketCount> {
    bucketing
        .buckets()
        .map(|bucket| {
            let value = bucketing.representative(bucket);
            BucketCount {
                bucket,
                label: bucketing.label(bucket),
                sketch_estimate: sketch.query(&value),
                exact_count: exact.query(&value),
            }
        })
        .collect()
}
