use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{Clock, Field, StationMax, StationRecord};
use crate::processors::window::{WindowBuffer, WindowSpec};

/// Which of N lockstep streams holds the largest window maximum
///
/// Window maxima are taken over the raw readings, sentinels included: a
/// stream whose window is entirely missing can still win when its sentinel
/// exceeds every other stream's readings. Such windows are reported at
/// `warn` level rather than corrected. Ties go to the first stream.
#[derive(Debug, Clone)]
pub struct MultiStreamArgMax {
    buffers: Vec<WindowBuffer<StationRecord>>,
    field: Field,
    clock: Clock,
    sentinel: f64,
    windows_emitted: usize,
    sentinel_wins: usize,
}

impl MultiStreamArgMax {
    pub fn new(
        streams: usize,
        spec: WindowSpec,
        field: Field,
        clock: Clock,
        sentinel: f64,
    ) -> Result<Self> {
        if streams == 0 {
            return Err(ProcessingError::Config(
                "At least one input stream is required".to_string(),
            ));
        }

        Ok(Self {
            buffers: (0..streams).map(|_| WindowBuffer::new(spec)).collect(),
            field,
            clock,
            sentinel,
            windows_emitted: 0,
            sentinel_wins: 0,
        })
    }

    pub fn streams(&self) -> usize {
        self.buffers.len()
    }

    /// Feed one positionally aligned record per stream
    pub fn push(&mut self, records: Vec<StationRecord>) -> Result<Option<StationMax>> {
        if records.len() != self.buffers.len() {
            return Err(ProcessingError::StreamMismatch {
                expected: self.buffers.len(),
                found: records.len(),
            });
        }

        // Buffers fill in lockstep, so either all flush or none do.
        let mut windows = Vec::with_capacity(self.buffers.len());
        for (buffer, record) in self.buffers.iter_mut().zip(records) {
            if let Some(window) = buffer.push(record) {
                windows.push(window);
            }
        }

        if windows.is_empty() {
            return Ok(None);
        }

        self.select(&windows).map(Some)
    }

    fn select(&mut self, windows: &[Vec<StationRecord>]) -> Result<StationMax> {
        let timestamp = windows[0][0].timestamp(self.clock)?;

        let mut best: Option<(usize, f64)> = None;
        for (position, window) in windows.iter().enumerate() {
            let window_max = self.window_max(window)?;
            match best {
                Some((_, current)) if window_max <= current => {}
                _ => best = Some((position, window_max)),
            }
        }

        let (position, max_value) = best.ok_or_else(|| {
            ProcessingError::MissingData("synchronized window without streams".to_string())
        })?;

        if max_value == self.sentinel {
            self.sentinel_wins += 1;
            warn!(
                %timestamp,
                station = position + 1,
                "window won by a sentinel maximum; every stream is missing data"
            );
        }

        self.windows_emitted += 1;
        debug!(%timestamp, station = position + 1, max_value, "synchronized window complete");

        Ok(StationMax {
            timestamp,
            station_index: position + 1,
            max_value,
        })
    }

    fn window_max(&self, window: &[StationRecord]) -> Result<f64> {
        let mut max = f64::NEG_INFINITY;
        for record in window {
            let value = record.value(self.field)?;
            if value > max {
                max = value;
            }
        }
        Ok(max)
    }

    pub fn windows_emitted(&self) -> usize {
        self.windows_emitted
    }

    /// Windows whose winning maximum was the sentinel
    pub fn sentinel_wins(&self) -> usize {
        self.sentinel_wins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::tests::sample_line;
    use crate::models::RecordAnnotator;
    use crate::utils::constants::DEFAULT_SENTINEL;

    fn record(i: usize, value: f64) -> StationRecord {
        let minutes = i * 5;
        let time = format!("{:02}{:02}", minutes / 60, minutes % 60);
        RecordAnnotator::new()
            .annotate(&sample_line("20210601", &time, value))
            .unwrap()
    }

    fn argmax(streams: usize, window_minutes: u32) -> MultiStreamArgMax {
        MultiStreamArgMax::new(
            streams,
            WindowSpec::new(window_minutes, 5).unwrap(),
            Field::AirTemperature,
            Clock::Utc,
            DEFAULT_SENTINEL,
        )
        .unwrap()
    }

    fn run(selector: &mut MultiStreamArgMax, streams: &[Vec<f64>]) -> Vec<StationMax> {
        let len = streams[0].len();
        (0..len)
            .filter_map(|i| {
                let tuple = streams.iter().map(|s| record(i, s[i])).collect();
                selector.push(tuple).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_strictly_highest_stream_wins_every_window() {
        let mut selector = argmax(3, 15);
        let streams = vec![
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0],
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        ];

        let out = run(&mut selector, &streams);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|w| w.station_index == 2));
        assert_eq!(out[0].max_value, 12.0);
        assert_eq!(out[1].max_value, 15.0);
    }

    #[test]
    fn test_ties_resolve_to_first_stream() {
        let mut selector = argmax(3, 10);
        let streams = vec![vec![1.0, 5.0], vec![5.0, 2.0], vec![5.0, 5.0]];

        let out = run(&mut selector, &streams);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].station_index, 1);
    }

    #[test]
    fn test_sentinel_can_win_when_all_streams_missing() {
        let mut selector = argmax(2, 10);
        let streams = vec![
            vec![DEFAULT_SENTINEL, DEFAULT_SENTINEL],
            vec![DEFAULT_SENTINEL, -10000.0],
        ];

        let out = run(&mut selector, &streams);
        assert_eq!(out[0].station_index, 1);
        assert_eq!(out[0].max_value, DEFAULT_SENTINEL);
        assert_eq!(selector.sentinel_wins(), 1);
    }

    #[test]
    fn test_timestamp_comes_from_first_stream() {
        let mut selector = argmax(2, 5);
        let first = record(0, 1.0);
        let second = RecordAnnotator::new()
            .annotate(&sample_line("19990101", "1200", 9.0))
            .unwrap();

        let out = selector.push(vec![first.clone(), second]).unwrap().unwrap();
        assert_eq!(out.timestamp, first.timestamp(Clock::Utc).unwrap());
        assert_eq!(out.station_index, 2);
    }

    #[test]
    fn test_rejects_wrong_tuple_width() {
        let mut selector = argmax(3, 15);
        let result = selector.push(vec![record(0, 1.0), record(0, 2.0)]);
        assert!(matches!(
            result,
            Err(ProcessingError::StreamMismatch {
                expected: 3,
                found: 2
            })
        ));
        assert!(MultiStreamArgMax::new(
            0,
            WindowSpec::new(60, 5).unwrap(),
            Field::AirTemperature,
            Clock::Utc,
            DEFAULT_SENTINEL
        )
        .is_err());
    }
}
