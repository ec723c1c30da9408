//! Recorded tracking sessions for offline replay.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Point, Sample};

/// One captured tracking frame: a timestamp and both wrist positions.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Capture time in milliseconds
    pub timestamp_ms: f64,
    /// Left wrist position, if tracked
    #[serde(default)]
    pub left: Option<Point>,
    /// Right wrist position, if tracked
    #[serde(default)]
    pub right: Option<Point>,
}

impl Frame {
    /// Creates a frame from a timestamp and optional wrist positions.
    pub fn new(timestamp_ms: f64, left: Option<Point>, right: Option<Point>) -> Self {
        Self {
            timestamp_ms,
            left,
            right,
        }
    }

    /// Returns the tempo-relevant sample: the vertical position of the
    /// conducting (right) hand.
    pub fn tempo_sample(&self) -> Sample {
        Sample::from(self.right.map(|point| point.y))
    }
}

/// A recorded tracking session, stored on disk as a bare JSON array of
/// frames.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Recording {
    frames: Vec<Frame>,
}

impl Recording {
    /// Creates a recording from captured frames.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Loads a recording from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Saves the recording to a JSON file, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Checks that the recording is non-empty and its timestamps never
    /// go backwards. Equal timestamps are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRecording`] or
    /// [`Error::NonMonotonicTimestamp`] naming the offending frame.
    pub fn validate(&self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::EmptyRecording);
        }
        for (index, pair) in self.frames.windows(2).enumerate() {
            if pair[1].timestamp_ms < pair[0].timestamp_ms {
                return Err(Error::NonMonotonicTimestamp {
                    index: index + 1,
                    previous_ms: pair[0].timestamp_ms,
                    timestamp_ms: pair[1].timestamp_ms,
                });
            }
        }
        Ok(())
    }

    /// Returns the captured frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` when no frames were captured.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the recorded time span in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }
}
