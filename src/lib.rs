//! # Gesture Tempo
//!
//! Turns tracked hand motion into a musical tempo. A conducting hand is
//! watched for sharp downward strokes, the intervals between them become
//! a smoothed BPM estimate, and the estimate drives playback controls.
//!
//! ## Features
//!
//! - Downbeat detection with hysteresis, debouncing and reverse-motion
//!   rejection
//! - Exponential BPM smoothing plus a rolling display average
//! - Playback rate and hand-separation level derived from tracking
//! - Recorded tracking sessions replayable from JSON files
//!
//! ## Example
//!
//! ```
//! use gesture_tempo::{DetectorConfig, Sample, TempoPipeline};
//!
//! let mut pipeline = TempoPipeline::new(DetectorConfig::builder().build());
//! let bpm = pipeline.tick(Sample::Tracked(240.0), 16.7);
//! assert!(bpm.is_none());
//! ```

pub mod config;
pub mod control;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod replay;
pub mod types;
pub mod window;

pub use config::{DetectorConfig, SeparationConfig, TrackingConfig};
pub use control::{RateMapper, SeparationLevel};
pub use detector::TempoDetector;
pub use error::{Error, Result};
pub use pipeline::TempoPipeline;
pub use replay::{Frame, Recording};
pub use types::{Arming, Downbeat, Point, Sample};
pub use window::BpmWindow;
