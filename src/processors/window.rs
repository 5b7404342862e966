use crate::error::{ProcessingError, Result};

/// Window length expressed as a record count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    window_minutes: u32,
    granularity_minutes: u32,
    size: usize,
}

impl WindowSpec {
    /// The window length must be a positive multiple of the data granularity
    pub fn new(window_minutes: u32, granularity_minutes: u32) -> Result<Self> {
        if granularity_minutes == 0 {
            return Err(ProcessingError::Config(
                "Data granularity must be at least one minute".to_string(),
            ));
        }

        if window_minutes == 0 || window_minutes % granularity_minutes != 0 {
            return Err(ProcessingError::Config(format!(
                "Window of {} minutes is not a positive multiple of the {}-minute granularity",
                window_minutes, granularity_minutes
            )));
        }

        Ok(Self {
            window_minutes,
            granularity_minutes,
            size: (window_minutes / granularity_minutes) as usize,
        })
    }

    /// Records per window (K)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    pub fn granularity_minutes(&self) -> u32 {
        self.granularity_minutes
    }
}

/// Fixed-capacity buffer that hands back its contents only when full
#[derive(Debug, Clone)]
pub struct WindowBuffer<T> {
    capacity: usize,
    items: Vec<T>,
}

impl<T> WindowBuffer<T> {
    pub fn new(spec: WindowSpec) -> Self {
        Self {
            capacity: spec.size(),
            items: Vec::with_capacity(spec.size()),
        }
    }

    /// Add an item; returns the complete window once `capacity` items are held
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.items.push(item);

        if self.items.len() == self.capacity {
            Some(std::mem::replace(
                &mut self.items,
                Vec::with_capacity(self.capacity),
            ))
        } else {
            None
        }
    }

    /// Items waiting for the window to fill; discarded at end of input
    pub fn pending(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
