//! Rolling average over recent BPM estimates.

use std::collections::VecDeque;

/// Averages the most recent BPM estimates into a stable display value.
///
/// Ticks without a fresh estimate keep returning the buffered average,
/// and an emptied queue falls back to the last raw value seen, so the
/// display holds steady instead of blanking.
#[derive(Debug, Clone)]
pub struct BpmWindow {
    readings: VecDeque<f32>,
    window_size: usize,
    last_raw: Option<f32>,
}

impl BpmWindow {
    /// Creates a window averaging up to `window_size` readings.
    ///
    /// A size of zero is treated as one.
    pub fn new(window_size: usize) -> Self {
        Self {
            readings: VecDeque::new(),
            window_size: window_size.max(1),
            last_raw: None,
        }
    }

    /// Records an optional BPM reading and returns the current average,
    /// rounded to one decimal place.
    ///
    /// When no readings are buffered the last raw value is returned
    /// as-is; before any reading has ever arrived this is `None`.
    pub fn observe(&mut self, bpm: Option<f32>) -> Option<f32> {
        if let Some(value) = bpm {
            self.last_raw = Some(value);
            self.readings.push_back(value);
        }
        while self.readings.len() > self.window_size {
            self.readings.pop_front();
        }

        if self.readings.is_empty() {
            return self.last_raw;
        }
        let mean = self.readings.iter().sum::<f32>() / self.readings.len() as f32;
        Some((mean * 10.0).round() / 10.0)
    }

    /// Changes the window size. A size of zero is treated as one.
    ///
    /// Excess readings are evicted on the next [`observe`](Self::observe)
    /// call rather than immediately.
    pub fn set_window_size(&mut self, window_size: usize) {
        self.window_size = window_size.max(1);
    }

    /// Discards all buffered readings.
    ///
    /// The remembered last raw value is kept, so the next reading-free
    /// [`observe`](Self::observe) still reports it.
    pub fn reset(&mut self) {
        self.readings.clear();
    }

    /// Returns the number of buffered readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns `true` when no readings are buffered.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Returns the configured window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}
