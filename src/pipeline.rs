//! Couples the detector with its display average.

use crate::config::DetectorConfig;
use crate::detector::TempoDetector;
use crate::types::Sample;
use crate::window::BpmWindow;

/// A tempo detector coupled with its display average.
///
/// Keeping both behind one `tick` call guarantees the average only ever
/// contains values produced under the current configuration.
#[derive(Debug, Clone)]
pub struct TempoPipeline {
    detector: TempoDetector,
    window: BpmWindow,
}

impl TempoPipeline {
    /// Creates a pipeline from a detector configuration.
    pub fn new(config: DetectorConfig) -> Self {
        let detector = TempoDetector::new(config);
        let window = BpmWindow::new(detector.config().bpm_average_window());
        Self { detector, window }
    }

    /// Feeds one sample through the detector and into the display
    /// average, returning the averaged BPM for display.
    pub fn tick(&mut self, sample: Sample, timestamp_ms: f64) -> Option<f32> {
        let bpm = self.detector.update(sample, timestamp_ms);
        self.window.observe(bpm)
    }

    /// Applies a new configuration to the detector and the display
    /// average in one step.
    ///
    /// The averaging window is resized and cleared together with the
    /// reconfiguration, so no value computed under the old settings can
    /// leak into the new average.
    pub fn set_config(&mut self, config: DetectorConfig) {
        self.detector.reconfigure(config);
        self.window
            .set_window_size(self.detector.config().bpm_average_window());
        self.window.reset();
        tracing::debug!("pipeline reconfigured, display average cleared");
    }

    /// Returns the underlying detector.
    pub fn detector(&self) -> &TempoDetector {
        &self.detector
    }

    /// Returns the display averaging window.
    pub fn window(&self) -> &BpmWindow {
        &self.window
    }
}
