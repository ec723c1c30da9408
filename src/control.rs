//! Playback controls derived from tracking: a tempo-driven rate and a
//! hand-separation level.

use std::collections::VecDeque;

use crate::config::SeparationConfig;
use crate::types::Point;

/// BPM mapped to the slowest playback rate
const RATE_MIN_BPM: f32 = 80.0;
/// BPM mapped to the fastest playback rate
const RATE_MAX_BPM: f32 = 160.0;
/// Playback rate at the low end of the BPM range
const MIN_RATE: f32 = 0.8;
/// Playback rate at the high end of the BPM range
const MAX_RATE: f32 = 1.2;
/// Weight of the newest target in the smoothed rate
const RATE_SMOOTHING: f32 = 0.2;

/// Maps the BPM estimate to a smoothed playback rate.
///
/// The mapping is linear from 80..160 BPM onto rates 0.8..1.2 and the
/// result eased with an exponential filter, so the rate glides rather
/// than steps when the conductor speeds up.
#[derive(Debug, Clone)]
pub struct RateMapper {
    last_rate: f32,
}

impl RateMapper {
    /// Creates a mapper resting at the neutral rate of 1.0.
    pub fn new() -> Self {
        Self { last_rate: 1.0 }
    }

    /// Folds a BPM estimate into the smoothed playback rate.
    ///
    /// Without a usable estimate the previous rate is returned
    /// unchanged, so the output never snaps back to neutral on
    /// tracking dropouts.
    pub fn compute(&mut self, bpm: Option<f32>) -> f32 {
        let Some(bpm) = bpm.filter(|bpm| bpm.is_finite()) else {
            return self.last_rate;
        };
        let clamped = bpm.clamp(RATE_MIN_BPM, RATE_MAX_BPM);
        let normalized = (clamped - RATE_MIN_BPM) / (RATE_MAX_BPM - RATE_MIN_BPM);
        let target = MIN_RATE + normalized * (MAX_RATE - MIN_RATE);
        self.last_rate = RATE_SMOOTHING * target + (1.0 - RATE_SMOOTHING) * self.last_rate;
        self.last_rate
    }

    /// Returns the most recently computed rate.
    pub fn last_rate(&self) -> f32 {
        self.last_rate
    }
}

impl Default for RateMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Averages the distance between both hands into a level in [0, 1].
///
/// Separations at or below the configured minimum map to 0.0 and at or
/// above the maximum to 1.0.
#[derive(Debug, Clone)]
pub struct SeparationLevel {
    config: SeparationConfig,
    levels: VecDeque<f32>,
}

impl SeparationLevel {
    /// Creates a separation level with the given configuration,
    /// sanitizing it first.
    pub fn new(config: SeparationConfig) -> Self {
        Self {
            config: config.sanitized(),
            levels: VecDeque::new(),
        }
    }

    /// Folds the current hand pair into the averaged level.
    ///
    /// Returns `None` without touching the average when either hand is
    /// missing or the distance is not finite.
    pub fn observe(&mut self, left: Option<Point>, right: Option<Point>) -> Option<f32> {
        let (left, right) = left.zip(right)?;
        let distance = left.distance_to(&right);
        if !distance.is_finite() {
            return None;
        }

        let clamped = distance.clamp(self.config.min_separation(), self.config.max_separation());
        let level = (clamped - self.config.min_separation())
            / (self.config.max_separation() - self.config.min_separation());
        self.levels.push_back(level);
        while self.levels.len() > self.config.average_window() {
            self.levels.pop_front();
        }
        Some(self.levels.iter().sum::<f32>() / self.levels.len() as f32)
    }

    /// Discards all buffered levels.
    pub fn reset(&mut self) {
        self.levels.clear();
    }

    /// Returns the active (sanitized) configuration.
    pub fn config(&self) -> SeparationConfig {
        self.config
    }
}
