//! Downbeat detection from tracked hand motion.

use crate::config::DetectorConfig;
use crate::types::{Arming, Downbeat, Sample};

/// Milliseconds per second, for interval conversions
const MS_PER_SECOND: f64 = 1000.0;
/// Lowest instantaneous BPM ever reported
const MIN_BPM: f32 = 40.0;
/// Highest instantaneous BPM ever reported
const MAX_BPM: f32 = 200.0;
/// Weight of the newest interval in the smoothed BPM
const BPM_SMOOTHING: f32 = 0.15;

/// Smoothed position state, only present while the hand is tracked.
#[derive(Debug, Clone, Copy)]
struct FilterState {
    /// Exponentially smoothed vertical position
    position: f32,
    /// Reference position for stroke and recovery measurements
    peak: f32,
}

/// Turns a stream of vertical hand positions into a smoothed BPM estimate.
///
/// The detector watches for fast downward strokes and keeps an
/// exponentially smoothed BPM derived from the intervals between them.
/// Missing or non-finite samples freeze the estimate instead of
/// corrupting it.
#[derive(Debug, Clone)]
pub struct TempoDetector {
    config: DetectorConfig,
    filter: Option<FilterState>,
    last_downbeat: Option<Downbeat>,
    smoothed_bpm: Option<f32>,
    arming: Arming,
}

impl TempoDetector {
    /// Creates a detector with the given configuration.
    ///
    /// The configuration is sanitized first, so out-of-range values are
    /// repaired rather than rejected.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config: config.sanitized(),
            filter: None,
            last_downbeat: None,
            smoothed_bpm: None,
            arming: Arming::Armed,
        }
    }

    /// Feeds one tracking sample and returns the smoothed BPM estimate.
    ///
    /// Each tick walks the same pipeline:
    ///
    /// 1. Lost or non-finite samples clear the position filter and re-arm
    /// 2. The first sample after a gap seeds the filter and nothing more
    /// 3. The position is exponentially smoothed and a velocity derived
    /// 4. Violent upward jumps are discarded outright
    /// 5. A cooling-down detector re-arms once the hand has recovered
    ///    far enough above the last downbeat
    /// 6. A fast enough downstroke that travelled far enough past the
    ///    last peak, outside the debounce interval, is accepted
    ///
    /// The returned value only changes on accepted downbeats.
    pub fn update(&mut self, sample: Sample, timestamp_ms: f64) -> Option<f32> {
        let Sample::Tracked(raw) = sample else {
            return self.signal_lost();
        };
        if !raw.is_finite() {
            return self.signal_lost();
        }

        let Some(filter) = self.filter.as_mut() else {
            self.filter = Some(FilterState {
                position: raw,
                peak: raw,
            });
            return self.smoothed_bpm;
        };

        let alpha = self.config.position_alpha();
        let previous = filter.position;
        let filtered = alpha * raw + (1.0 - alpha) * previous;
        filter.position = filtered;

        // Screen y grows downward, so a positive velocity is a downstroke.
        let velocity = filtered - previous;

        if velocity < self.config.reverse_velocity_limit() {
            return self.smoothed_bpm;
        }

        if self.arming == Arming::CoolingDown {
            if filter.peak - filtered >= self.config.min_recovery_pixels() {
                self.arming = Arming::Armed;
            } else {
                return self.smoothed_bpm;
            }
        }

        if velocity <= self.config.velocity_threshold() {
            return self.smoothed_bpm;
        }

        let stroke = filtered - filter.peak;
        if stroke < self.config.min_stroke_pixels() {
            tracing::trace!("downstroke of {:.1} px too short, ignored", stroke);
            return self.smoothed_bpm;
        }

        if let Some(last) = self.last_downbeat
            && timestamp_ms - last.timestamp_ms < self.config.min_interval_ms()
        {
            tracing::trace!("downbeat inside the debounce interval, ignored");
            return self.smoothed_bpm;
        }

        let instant_bpm = self.last_downbeat.and_then(|last| {
            let interval_sec = (timestamp_ms - last.timestamp_ms) / MS_PER_SECOND;
            (interval_sec > 0.0).then(|| ((60.0 / interval_sec) as f32).clamp(MIN_BPM, MAX_BPM))
        });

        if let Some(instant) = instant_bpm {
            self.smoothed_bpm = Some(match self.smoothed_bpm {
                Some(previous) => BPM_SMOOTHING * instant + (1.0 - BPM_SMOOTHING) * previous,
                None => instant,
            });
        }

        filter.peak = filtered;
        self.last_downbeat = Some(Downbeat::new(timestamp_ms, filtered, instant_bpm));
        self.arming = Arming::CoolingDown;
        tracing::debug!(
            "downbeat at {:.0} ms, instant {:?}, smoothed {:?}",
            timestamp_ms,
            instant_bpm,
            self.smoothed_bpm
        );

        self.smoothed_bpm
    }

    /// Replaces the configuration, sanitizing it first.
    ///
    /// Motion state is cleared so stale distances measured under the old
    /// thresholds cannot trigger a spurious downbeat, but the smoothed
    /// BPM and the last downbeat survive so the reported tempo does not
    /// jump.
    pub fn reconfigure(&mut self, config: DetectorConfig) {
        self.config = config.sanitized();
        self.filter = None;
        self.arming = Arming::Armed;
        tracing::debug!("detector reconfigured, motion state cleared");
    }

    /// Returns the current smoothed BPM estimate, if any downbeat
    /// interval has been measured yet.
    pub fn smoothed_bpm(&self) -> Option<f32> {
        self.smoothed_bpm
    }

    /// Returns the filtered vertical position while the hand is tracked.
    pub fn filtered_position(&self) -> Option<f32> {
        self.filter.map(|filter| filter.position)
    }

    /// Returns the most recently accepted downbeat.
    pub fn last_downbeat(&self) -> Option<Downbeat> {
        self.last_downbeat
    }

    /// Returns the current arming state.
    pub fn arming(&self) -> Arming {
        self.arming
    }

    /// Returns the active (sanitized) configuration.
    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    fn signal_lost(&mut self) -> Option<f32> {
        if self.filter.take().is_some() {
            tracing::trace!("tracking lost, position filter cleared");
        }
        self.arming = Arming::Armed;
        self.smoothed_bpm
    }
}

#[cfg(test)]
mod tests {
    use super::TempoDetector;
    use crate::config::DetectorConfig;
    use crate::types::{Arming, Sample};

    const TICK_MS: f64 = 20.0;

    fn steady_config() -> DetectorConfig {
        DetectorConfig::builder()
            .position_alpha(1.0)
            .velocity_threshold(2.0)
            .min_stroke_pixels(5.0)
            .min_recovery_pixels(10.0)
            .min_interval_ms(300.0)
            .build()
    }

    fn permissive_config() -> DetectorConfig {
        DetectorConfig::builder()
            .position_alpha(1.0)
            .min_stroke_pixels(0.0)
            .min_recovery_pixels(0.0)
            .min_interval_ms(500.0)
            .build()
    }

    /// One conducting cycle: a dwell at the top, then down and back up.
    fn trapezoid_cycle() -> Vec<f32> {
        let mut wave = vec![100.0; 8];
        wave.extend((1..=15).map(|step| 100.0 + 20.0 * step as f32));
        wave.extend([350.0, 300.0, 250.0, 200.0, 150.0, 100.0]);
        wave
    }

    fn feed_cycles(detector: &mut TempoDetector, cycles: usize, mut t: f64) -> (Option<f32>, f64) {
        let mut bpm = None;
        for _ in 0..cycles {
            for y in trapezoid_cycle() {
                bpm = detector.update(Sample::Tracked(y), t);
                t += TICK_MS;
            }
        }
        (bpm, t)
    }

    #[test]
    fn steady_wave_converges_near_true_tempo() {
        let mut detector = TempoDetector::new(steady_config());
        let (bpm, _) = feed_cycles(&mut detector, 10, 0.0);
        let bpm = bpm.unwrap();
        assert!((bpm - 100.0).abs() < 5.0, "smoothed BPM was {bpm}");

        let instant = detector.last_downbeat().unwrap().instant_bpm.unwrap();
        assert!((instant - 100.0).abs() < 0.01, "instant BPM was {instant}");
    }

    #[test]
    fn first_downbeat_carries_no_instant_bpm() {
        let mut detector = TempoDetector::new(steady_config());
        let (bpm, _) = feed_cycles(&mut detector, 1, 0.0);
        assert_eq!(bpm, None);

        let downbeat = detector.last_downbeat().unwrap();
        assert_eq!(downbeat.instant_bpm, None);
        assert_eq!(downbeat.timestamp_ms, 160.0);
    }

    #[test]
    fn debounce_enforces_the_minimum_interval() {
        let mut detector = TempoDetector::new(permissive_config());
        let mut beats = Vec::new();
        let mut y = 100.0;
        let mut t = 0.0;
        while t <= 2000.0 {
            detector.update(Sample::Tracked(y), t);
            if let Some(downbeat) = detector.last_downbeat()
                && beats.last() != Some(&downbeat.timestamp_ms)
            {
                beats.push(downbeat.timestamp_ms);
            }
            y = if y == 100.0 { 200.0 } else { 100.0 };
            t += 100.0;
        }

        assert_eq!(beats, vec![100.0, 700.0, 1300.0, 1900.0]);
        for pair in beats.windows(2) {
            assert!(pair[1] - pair[0] >= 500.0);
        }
        let bpm = detector.smoothed_bpm().unwrap();
        assert!((bpm - 100.0).abs() < 0.2, "smoothed BPM was {bpm}");
    }

    #[test]
    fn instant_bpm_clamps_to_floor_on_very_slow_beats() {
        let mut detector = TempoDetector::new(permissive_config());
        detector.update(Sample::Tracked(100.0), 0.0);
        detector.update(Sample::Tracked(200.0), 100.0);
        let mut t = 200.0;
        while t < 20_000.0 {
            detector.update(Sample::Tracked(100.0), t);
            t += 100.0;
        }
        detector.update(Sample::Tracked(200.0), 20_100.0);

        let downbeat = detector.last_downbeat().unwrap();
        assert_eq!(downbeat.timestamp_ms, 20_100.0);
        assert_eq!(downbeat.instant_bpm, Some(40.0));
    }

    #[test]
    fn instant_bpm_clamps_to_ceiling_on_very_fast_beats() {
        let config = DetectorConfig::builder()
            .position_alpha(1.0)
            .min_stroke_pixels(0.0)
            .min_recovery_pixels(0.0)
            .min_interval_ms(10.0)
            .build();
        let mut detector = TempoDetector::new(config);
        detector.update(Sample::Tracked(100.0), 0.0);
        detector.update(Sample::Tracked(200.0), 100.0);
        detector.update(Sample::Tracked(100.0), 200.0);
        detector.update(Sample::Tracked(200.0), 300.0);

        let downbeat = detector.last_downbeat().unwrap();
        assert_eq!(downbeat.timestamp_ms, 300.0);
        assert_eq!(downbeat.instant_bpm, Some(200.0));
    }

    #[test]
    fn smoothed_bpm_blends_instead_of_jumping() {
        let mut detector = TempoDetector::new(permissive_config());
        detector.update(Sample::Tracked(100.0), 0.0);
        detector.update(Sample::Tracked(200.0), 100.0);
        detector.update(Sample::Tracked(100.0), 400.0);
        detector.update(Sample::Tracked(200.0), 700.0);
        detector.update(Sample::Tracked(100.0), 1000.0);
        detector.update(Sample::Tracked(200.0), 1300.0);
        let settled = detector.smoothed_bpm().unwrap();
        assert!((settled - 100.0).abs() < 1e-3);

        detector.update(Sample::Tracked(100.0), 1500.0);
        detector.update(Sample::Tracked(200.0), 1800.0);
        let blended = detector.smoothed_bpm().unwrap();
        assert!((blended - 103.0).abs() < 0.1, "blended BPM was {blended}");
    }

    #[test]
    fn jitter_below_thresholds_is_ignored() {
        let mut detector = TempoDetector::new(DetectorConfig::default());
        let mut t = 0.0;
        for tick in 0..200 {
            let y = if tick % 2 == 0 { 100.0 } else { 108.0 };
            let bpm = detector.update(Sample::Tracked(y), t);
            assert_eq!(bpm, None);
            t += TICK_MS;
        }
        assert!(detector.last_downbeat().is_none());
    }

    #[test]
    fn reverse_guard_skips_recovery_accounting() {
        let config = DetectorConfig::builder().position_alpha(1.0).build();
        let mut detector = TempoDetector::new(config);
        let mut downbeats = 0;
        let mut last_seen = None;
        let mut t = 0.0;
        for tick in 0..40 {
            let y = if tick % 2 == 0 { 100.0 } else { 130.0 };
            detector.update(Sample::Tracked(y), t);
            let latest = detector.last_downbeat().map(|d| d.timestamp_ms);
            if latest != last_seen {
                downbeats += 1;
                last_seen = latest;
            }
            t += 200.0;
        }

        // The upward swings all exceed the reverse limit, so they never
        // count toward recovery and the detector stays cooling down.
        assert_eq!(downbeats, 1);
    }

    #[test]
    fn tracking_loss_freezes_the_estimate() {
        let mut detector = TempoDetector::new(steady_config());
        let (_, t) = feed_cycles(&mut detector, 5, 0.0);
        let before = detector.smoothed_bpm();
        assert!(before.is_some());

        let during = detector.update(Sample::Lost, t);
        assert_eq!(during, before);
        assert_eq!(detector.filtered_position(), None);
        assert_eq!(detector.arming(), Arming::Armed);

        let still = detector.update(Sample::Tracked(f32::NAN), t + TICK_MS);
        assert_eq!(still, before);
        assert_eq!(detector.filtered_position(), None);

        let resumed = detector.update(Sample::Tracked(250.0), t + 2.0 * TICK_MS);
        assert_eq!(resumed, before);
        assert_eq!(detector.filtered_position(), Some(250.0));
    }

    #[test]
    fn static_hand_never_produces_a_tempo() {
        let mut detector = TempoDetector::new(DetectorConfig::default());
        for tick in 0..100 {
            let bpm = detector.update(Sample::Tracked(250.0), tick as f64 * TICK_MS);
            assert_eq!(bpm, None);
        }
        let position = detector.filtered_position().unwrap();
        assert!((position - 250.0).abs() < 1e-3);
        assert!(detector.last_downbeat().is_none());
    }

    #[test]
    fn holding_still_preserves_the_estimate() {
        let mut detector = TempoDetector::new(steady_config());
        let (_, mut t) = feed_cycles(&mut detector, 6, 0.0);
        let before_bpm = detector.smoothed_bpm();
        let before_beat = detector.last_downbeat().map(|d| d.timestamp_ms);
        let hold = detector.filtered_position().unwrap();

        for _ in 0..100 {
            let bpm = detector.update(Sample::Tracked(hold), t);
            assert_eq!(bpm, before_bpm);
            t += TICK_MS;
        }
        assert_eq!(detector.last_downbeat().map(|d| d.timestamp_ms), before_beat);
    }

    #[test]
    fn reconfigure_preserves_tempo_but_clears_motion_state() {
        let mut detector = TempoDetector::new(steady_config());
        feed_cycles(&mut detector, 6, 0.0);
        let before_bpm = detector.smoothed_bpm();
        let before_beat = detector.last_downbeat().map(|d| d.timestamp_ms);
        assert!(before_bpm.is_some());

        detector.reconfigure(DetectorConfig::builder().min_interval_ms(400.0).build());

        assert_eq!(detector.smoothed_bpm(), before_bpm);
        assert_eq!(detector.last_downbeat().map(|d| d.timestamp_ms), before_beat);
        assert_eq!(detector.filtered_position(), None);
        assert_eq!(detector.arming(), Arming::Armed);
        assert_eq!(detector.config().min_interval_ms(), 400.0);
    }

    #[test]
    fn construction_sanitizes_the_config() {
        let config = DetectorConfig::builder().position_alpha(f32::NAN).build();
        let detector = TempoDetector::new(config);
        assert_eq!(detector.config().position_alpha(), 0.35);
    }
}
