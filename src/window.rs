use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::reading::Reading;

// Rolling buffer of recent readings, kept as three parallel sequences.
// Only `push` mutates them, so their lengths never diverge.
#[derive(Debug)]
pub struct Window {
    timestamps: VecDeque<DateTime<Local>>,
    values: VecDeque<f64>,
    warnings: VecDeque<bool>,
    capacity: usize,
}

/// Owned copy of the window taken for one redraw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSnapshot {
    pub timestamps: Vec<DateTime<Local>>,
    pub values: Vec<f64>,
    pub warnings: Vec<bool>,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            timestamps: VecDeque::with_capacity(capacity),
            values: VecDeque::with_capacity(capacity),
            warnings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest one when at capacity.
    /// Returns the evicted value, if any.
    pub fn push(&mut self, reading: &Reading) -> Option<f64> {
        self.timestamps.push_back(reading.timestamp);
        self.values.push_back(reading.value);
        self.warnings.push_back(reading.exceeds_threshold);

        if self.values.len() > self.capacity {
            self.timestamps.pop_front();
            self.warnings.pop_front();
            return self.values.pop_front();
        }
        None
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            timestamps: self.timestamps.iter().copied().collect(),
            values: self.values.iter().copied().collect(),
            warnings: self.warnings.iter().copied().collect(),
        }
    }
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.timestamps.len() == self.values.len() && self.values.len() == self.warnings.len()
    }

    pub fn latest(&self) -> Option<(DateTime<Local>, f64, bool)> {
        let i = self.len().checked_sub(1)?;
        Some((self.timestamps[i], self.values[i], self.warnings[i]))
    }

    /// (index, value) pairs for plotting
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64, v))
            .collect()
    }

    pub fn warning_points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .zip(&self.warnings)
            .enumerate()
            .filter(|(_, (_, warn))| **warn)
            .map(|(i, (&v, _))| (i as f64, v))
            .collect()
    }
}
