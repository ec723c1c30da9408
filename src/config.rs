//! Configuration types for the tempo engine.

use std::path::Path;

use crate::error::Result;

/// Default minimum time between accepted downbeats (ms)
const MIN_INTERVAL_MS: f64 = 360.0;
/// Default minimum downward velocity that can start a downbeat (px/tick)
const VELOCITY_THRESHOLD: f32 = 2.0;
/// Default velocity below which a sample counts as violent upward motion
const REVERSE_VELOCITY_LIMIT: f32 = -3.5;
/// Default minimum filtered travel past the last peak (px)
const MIN_STROKE_PIXELS: f32 = 14.0;
/// Default upward travel required to re-arm after a downbeat (px)
const MIN_RECOVERY_PIXELS: f32 = 22.0;
/// Default smoothing factor for the position filter
const POSITION_ALPHA: f32 = 0.35;
/// Default number of recent BPM values averaged for display
const BPM_AVERAGE_WINDOW: usize = 4;

/// Default hand separation mapped to level 0.0 (px)
const MIN_SEPARATION: f32 = 40.0;
/// Default hand separation mapped to level 1.0 (px)
const MAX_SEPARATION: f32 = 600.0;
/// Default number of recent separation levels averaged
const SEPARATION_WINDOW: usize = 4;

/// Configuration for the tempo detector.
///
/// Use the builder pattern to customize detector parameters:
///
/// # Example
///
/// ```
/// use gesture_tempo::DetectorConfig;
///
/// let config = DetectorConfig::builder()
///     .min_interval_ms(300.0)
///     .velocity_threshold(3.0)
///     .build();
/// ```
#[derive(Clone, Debug, Copy, bon::Builder, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    /// Minimum time between accepted downbeats in milliseconds (default: 360.0)
    #[builder(default = MIN_INTERVAL_MS)]
    min_interval_ms: f64,
    /// Minimum per-tick downward velocity to consider a downbeat (default: 2.0)
    #[builder(default = VELOCITY_THRESHOLD)]
    velocity_threshold: f32,
    /// Velocity below which the tick is ignored as a reverse jump (default: -3.5)
    #[builder(default = REVERSE_VELOCITY_LIMIT)]
    reverse_velocity_limit: f32,
    /// Minimum filtered travel past the last peak to count as a stroke (default: 14.0)
    #[builder(default = MIN_STROKE_PIXELS)]
    min_stroke_pixels: f32,
    /// Upward travel required after a downbeat before the next one (default: 22.0)
    #[builder(default = MIN_RECOVERY_PIXELS)]
    min_recovery_pixels: f32,
    /// Smoothing factor for the position filter, in (0, 1] (default: 0.35)
    #[builder(default = POSITION_ALPHA)]
    position_alpha: f32,
    /// Number of recent BPM values averaged for display (default: 4)
    #[builder(default = BPM_AVERAGE_WINDOW)]
    bpm_average_window: usize,
}

impl DetectorConfig {
    /// Creates a preset for wide, deliberate conducting strokes.
    pub fn broad() -> Self {
        Self::builder()
            .min_interval_ms(450.0)
            .min_stroke_pixels(24.0)
            .min_recovery_pixels(36.0)
            .build()
    }

    /// Creates a preset for small, fast gestures close to the camera.
    pub fn compact() -> Self {
        Self::builder()
            .min_interval_ms(250.0)
            .velocity_threshold(1.5)
            .min_stroke_pixels(8.0)
            .min_recovery_pixels(12.0)
            .position_alpha(0.45)
            .build()
    }

    /// Returns the minimum downbeat interval in milliseconds.
    pub fn min_interval_ms(&self) -> f64 {
        self.min_interval_ms
    }

    /// Returns the downbeat velocity threshold.
    pub fn velocity_threshold(&self) -> f32 {
        self.velocity_threshold
    }

    /// Returns the reverse-motion velocity limit.
    pub fn reverse_velocity_limit(&self) -> f32 {
        self.reverse_velocity_limit
    }

    /// Returns the minimum stroke length in pixels.
    pub fn min_stroke_pixels(&self) -> f32 {
        self.min_stroke_pixels
    }

    /// Returns the minimum recovery distance in pixels.
    pub fn min_recovery_pixels(&self) -> f32 {
        self.min_recovery_pixels
    }

    /// Returns the position filter smoothing factor.
    pub fn position_alpha(&self) -> f32 {
        self.position_alpha
    }

    /// Returns the BPM averaging window size.
    pub fn bpm_average_window(&self) -> usize {
        self.bpm_average_window
    }

    /// Returns a copy with every field forced into its valid range.
    ///
    /// Out-of-range values are clamped to the nearest valid value and
    /// non-finite values fall back to the default; nothing is ever
    /// rejected. Each repaired field is logged.
    pub fn sanitized(&self) -> Self {
        let bpm_average_window = if self.bpm_average_window == 0 {
            tracing::warn!("bpm_average_window of 0 raised to 1");
            1
        } else {
            self.bpm_average_window
        };

        Self {
            min_interval_ms: sanitize_f64(
                "min_interval_ms",
                self.min_interval_ms,
                1e-3,
                f64::INFINITY,
                MIN_INTERVAL_MS,
            ),
            velocity_threshold: sanitize_f32(
                "velocity_threshold",
                self.velocity_threshold,
                1e-3,
                f32::INFINITY,
                VELOCITY_THRESHOLD,
            ),
            reverse_velocity_limit: sanitize_f32(
                "reverse_velocity_limit",
                self.reverse_velocity_limit,
                f32::NEG_INFINITY,
                -1e-3,
                REVERSE_VELOCITY_LIMIT,
            ),
            min_stroke_pixels: sanitize_f32(
                "min_stroke_pixels",
                self.min_stroke_pixels,
                0.0,
                f32::INFINITY,
                MIN_STROKE_PIXELS,
            ),
            min_recovery_pixels: sanitize_f32(
                "min_recovery_pixels",
                self.min_recovery_pixels,
                0.0,
                f32::INFINITY,
                MIN_RECOVERY_PIXELS,
            ),
            position_alpha: sanitize_f32(
                "position_alpha",
                self.position_alpha,
                1e-3,
                1.0,
                POSITION_ALPHA,
            ),
            bpm_average_window,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for the hand separation level.
///
/// Distances at or below `min_separation` map to level 0.0, distances at
/// or above `max_separation` map to level 1.0.
#[derive(Clone, Debug, Copy, bon::Builder, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeparationConfig {
    /// Separation mapped to level 0.0, in pixels (default: 40.0)
    #[builder(default = MIN_SEPARATION)]
    min_separation: f32,
    /// Separation mapped to level 1.0, in pixels (default: 600.0)
    #[builder(default = MAX_SEPARATION)]
    max_separation: f32,
    /// Number of recent levels averaged (default: 4)
    #[builder(default = SEPARATION_WINDOW)]
    average_window: usize,
}

impl SeparationConfig {
    /// Returns the separation mapped to level 0.0.
    pub fn min_separation(&self) -> f32 {
        self.min_separation
    }

    /// Returns the separation mapped to level 1.0.
    pub fn max_separation(&self) -> f32 {
        self.max_separation
    }

    /// Returns the averaging window size.
    pub fn average_window(&self) -> usize {
        self.average_window
    }

    /// Returns a copy with every field forced into its valid range.
    ///
    /// Follows the same repair rules as [`DetectorConfig::sanitized`];
    /// additionally `max_separation` is kept strictly above
    /// `min_separation` so normalization stays well defined.
    pub fn sanitized(&self) -> Self {
        let average_window = if self.average_window == 0 {
            tracing::warn!("average_window of 0 raised to 1");
            1
        } else {
            self.average_window
        };

        let min_separation = sanitize_f32(
            "min_separation",
            self.min_separation,
            0.0,
            f32::INFINITY,
            MIN_SEPARATION,
        );
        let mut max_separation = sanitize_f32(
            "max_separation",
            self.max_separation,
            0.0,
            f32::INFINITY,
            MAX_SEPARATION,
        );
        if max_separation <= min_separation {
            max_separation = min_separation + 1.0;
            tracing::warn!(
                "max_separation not above min_separation, raised to {}",
                max_separation
            );
        }

        Self {
            min_separation,
            max_separation,
            average_window,
        }
    }
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Complete tracking configuration: beat detection plus hand separation.
///
/// Loadable from a JSON file; omitted fields take their defaults.
#[derive(Clone, Debug, Copy, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingConfig {
    /// Beat detection parameters
    pub beat: DetectorConfig,
    /// Hand separation parameters
    pub separation: SeparationConfig,
}

impl TrackingConfig {
    /// Loads a tracking configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Saves the tracking configuration to a JSON file, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

/// Clamps `value` into `[min, max]`, falling back to `default` when it
/// is not finite. Logs every repair.
fn sanitize_f32(name: &str, value: f32, min: f32, max: f32, default: f32) -> f32 {
    if !value.is_finite() {
        tracing::warn!("{} is not finite, using default {}", name, default);
        return default;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!("{} out of range, clamped from {} to {}", name, value, clamped);
    }
    clamped
}

/// `f64` twin of [`sanitize_f32`].
fn sanitize_f64(name: &str, value: f64, min: f64, max: f64, default: f64) -> f64 {
    if !value.is_finite() {
        tracing::warn!("{} is not finite, using default {}", name, default);
        return default;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!("{} out of range, clamped from {} to {}", name, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::{DetectorConfig, SeparationConfig, TrackingConfig};

    #[test]
    fn defaults_match_shipped_values() {
        let config = DetectorConfig::builder().build();
        assert_eq!(config.min_interval_ms(), 360.0);
        assert_eq!(config.velocity_threshold(), 2.0);
        assert_eq!(config.reverse_velocity_limit(), -3.5);
        assert_eq!(config.min_stroke_pixels(), 14.0);
        assert_eq!(config.min_recovery_pixels(), 22.0);
        assert_eq!(config.position_alpha(), 0.35);
        assert_eq!(config.bpm_average_window(), 4);
    }

    #[test]
    fn sanitize_keeps_valid_values() {
        let config = DetectorConfig::builder()
            .min_interval_ms(250.0)
            .position_alpha(0.5)
            .bpm_average_window(8)
            .build()
            .sanitized();
        assert_eq!(config.min_interval_ms(), 250.0);
        assert_eq!(config.position_alpha(), 0.5);
        assert_eq!(config.bpm_average_window(), 8);
    }

    #[test]
    fn sanitize_clamps_out_of_range() {
        let config = DetectorConfig::builder()
            .min_interval_ms(-5.0)
            .velocity_threshold(0.0)
            .reverse_velocity_limit(2.0)
            .min_stroke_pixels(-3.0)
            .position_alpha(1.5)
            .bpm_average_window(0)
            .build()
            .sanitized();
        assert_eq!(config.min_interval_ms(), 1e-3);
        assert_eq!(config.velocity_threshold(), 1e-3);
        assert_eq!(config.reverse_velocity_limit(), -1e-3);
        assert_eq!(config.min_stroke_pixels(), 0.0);
        assert_eq!(config.position_alpha(), 1.0);
        assert_eq!(config.bpm_average_window(), 1);
    }

    #[test]
    fn sanitize_replaces_non_finite() {
        let config = DetectorConfig::builder()
            .min_interval_ms(f64::INFINITY)
            .velocity_threshold(f32::NAN)
            .position_alpha(f32::NAN)
            .build()
            .sanitized();
        assert_eq!(config.min_interval_ms(), 360.0);
        assert_eq!(config.velocity_threshold(), 2.0);
        assert_eq!(config.position_alpha(), 0.35);
    }

    #[test]
    fn separation_sanitize_keeps_range_ordered() {
        let config = SeparationConfig::builder()
            .min_separation(100.0)
            .max_separation(50.0)
            .average_window(0)
            .build()
            .sanitized();
        assert_eq!(config.min_separation(), 100.0);
        assert_eq!(config.max_separation(), 101.0);
        assert_eq!(config.average_window(), 1);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let parsed: TrackingConfig =
            serde_json::from_str(r#"{"beat":{"minIntervalMs":300.0}}"#).unwrap();
        assert_eq!(parsed.beat.min_interval_ms(), 300.0);
        assert_eq!(parsed.beat.velocity_threshold(), 2.0);
        assert_eq!(parsed.separation.min_separation(), 40.0);
    }

    #[test]
    fn json_round_trip() {
        let config = TrackingConfig {
            beat: DetectorConfig::compact(),
            separation: SeparationConfig::builder().max_separation(500.0).build(),
        };
        let raw = serde_json::to_string(&config).unwrap();
        let parsed: TrackingConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.beat.min_interval_ms(), 250.0);
        assert_eq!(parsed.beat.min_stroke_pixels(), 8.0);
        assert_eq!(parsed.separation.max_separation(), 500.0);
    }

    #[test]
    fn presets_differ_from_defaults() {
        assert!(DetectorConfig::broad().min_interval_ms() > 360.0);
        assert!(DetectorConfig::compact().min_interval_ms() < 360.0);
        assert!(
            DetectorConfig::compact().min_stroke_pixels()
                < DetectorConfig::broad().min_stroke_pixels()
        );
    }
}
