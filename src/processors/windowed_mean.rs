use tracing::debug;

use crate::error::Result;
use crate::models::{Clock, Field, StationRecord, WindowMean};
use crate::processors::window::{WindowBuffer, WindowSpec};

/// Mean of a field over disjoint windows of K consecutive records
///
/// Sentinel readings are dropped before averaging. A window made only of
/// sentinels yields the sentinel. A trailing partial window is never emitted.
#[derive(Debug, Clone)]
pub struct WindowedMean {
    buffer: WindowBuffer<StationRecord>,
    field: Field,
    clock: Clock,
    sentinel: f64,
    windows_emitted: usize,
    missing_windows: usize,
}

impl WindowedMean {
    pub fn new(spec: WindowSpec, field: Field, clock: Clock, sentinel: f64) -> Self {
        Self {
            buffer: WindowBuffer::new(spec),
            field,
            clock,
            sentinel,
            windows_emitted: 0,
            missing_windows: 0,
        }
    }

    /// Feed the next record; returns the window mean when the window fills
    pub fn push(&mut self, record: StationRecord) -> Result<Option<WindowMean>> {
        match self.buffer.push(record) {
            Some(window) => self.aggregate(&window).map(Some),
            None => Ok(None),
        }
    }

    fn aggregate(&mut self, window: &[StationRecord]) -> Result<WindowMean> {
        let timestamp = window[0].timestamp(self.clock)?;

        let mut sum = 0.0;
        let mut present = 0usize;
        for record in window {
            let value = record.value(self.field)?;
            if value != self.sentinel {
                sum += value;
                present += 1;
            }
        }

        let mean = if present > 0 {
            sum / present as f64
        } else {
            self.missing_windows += 1;
            self.sentinel
        };

        self.windows_emitted += 1;
        debug!(%timestamp, mean, present, "window complete");

        Ok(WindowMean { timestamp, mean })
    }

    pub fn windows_emitted(&self) -> usize {
        self.windows_emitted
    }

    /// Windows in which every reading was the sentinel
    pub fn missing_windows(&self) -> usize {
        self.missing_windows
    }

    /// Records buffered in the incomplete trailing window
    pub fn pending(&self) -> usize {
        self.buffer.pending()
    }
}
