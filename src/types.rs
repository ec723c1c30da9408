//! Core types for gesture tempo detection.

/// One position observation delivered to the detector.
///
/// The upstream tracker either found the followed feature this tick and
/// reports its vertical pixel coordinate, or it did not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// The feature was found at this vertical position.
    Tracked(f32),
    /// The feature was not found this tick.
    Lost,
}

impl Sample {
    /// Returns the position carried by a tracked sample.
    pub fn position(&self) -> Option<f32> {
        match self {
            Sample::Tracked(position) => Some(*position),
            Sample::Lost => None,
        }
    }

    /// Returns true if the feature was not found this tick.
    pub fn is_lost(&self) -> bool {
        matches!(self, Sample::Lost)
    }
}

impl From<Option<f32>> for Sample {
    fn from(position: Option<f32>) -> Self {
        match position {
            Some(position) => Sample::Tracked(position),
            None => Sample::Lost,
        }
    }
}

/// Hysteresis state of the tempo detector.
///
/// A downbeat can only be accepted while `Armed`. After each accepted
/// downbeat the detector cools down until the hand has risen far enough
/// above the last peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arming {
    /// The next downbeat may be accepted.
    Armed,
    /// Waiting for sufficient upward recovery before re-arming.
    CoolingDown,
}

/// A pixel coordinate of a tracked feature.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate in pixels
    pub x: f32,
    /// Vertical coordinate in pixels, growing downwards
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// One accepted gesture beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Downbeat {
    /// Time of acceptance in milliseconds
    pub timestamp_ms: f64,
    /// Filtered position at acceptance
    pub position: f32,
    /// BPM implied by the interval since the previous downbeat, clamped
    /// to the detection range; `None` for the first downbeat
    pub instant_bpm: Option<f32>,
}

impl Downbeat {
    /// Creates a new downbeat event.
    pub fn new(timestamp_ms: f64, position: f32, instant_bpm: Option<f32>) -> Self {
        Self {
            timestamp_ms,
            position,
            instant_bpm,
        }
    }
}
