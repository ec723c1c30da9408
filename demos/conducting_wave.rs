//! Example: Conducting a tempo with a synthetic hand wave
//!
//! Synthesizes the vertical wrist motion of a conductor beating at
//! 100 BPM, with short tracking dropouts between strokes, and feeds it
//! through the tempo pipeline.

use gesture_tempo::{DetectorConfig, RateMapper, Sample, TempoPipeline};

/// Frame spacing of the synthetic capture (50 fps)
const TICK_MS: f64 = 20.0;

/// One 600 ms conducting cycle: a dwell at the top and a sharp
/// downstroke, then the swing back up and a short tracking dropout.
fn conducting_cycle() -> Vec<Sample> {
    let mut cycle = vec![Sample::Tracked(100.0); 6];
    cycle.extend((1..=8).map(|step| Sample::Tracked(100.0 + 50.0 * step as f32)));
    cycle.extend(
        [
            460.0, 420.0, 380.0, 340.0, 300.0, 260.0, 220.0, 180.0, 150.0, 130.0, 115.0, 105.0,
        ]
        .map(Sample::Tracked),
    );
    cycle.extend([Sample::Lost; 4]);
    cycle
}

fn main() {
    // Default thresholds, as the live tracker ships them
    let mut pipeline = TempoPipeline::new(DetectorConfig::builder().build());
    let mut rate = RateMapper::new();

    println!("Conducting at 100 BPM with a synthetic hand wave...\n");

    let mut t = 0.0;
    let mut last_beat = None;
    let mut last_shown = None;

    for _ in 0..12 {
        for sample in conducting_cycle() {
            let shown = pipeline.tick(sample, t);
            let playback = rate.compute(shown);

            // Report every accepted downbeat
            if let Some(downbeat) = pipeline.detector().last_downbeat()
                && last_beat != Some(downbeat.timestamp_ms)
            {
                match downbeat.instant_bpm {
                    Some(instant) => println!(
                        "🥁 Downbeat at {:.2}s ({:.1} BPM)",
                        downbeat.timestamp_ms / 1000.0,
                        instant
                    ),
                    None => println!("🥁 Downbeat at {:.2}s", downbeat.timestamp_ms / 1000.0),
                }
                last_beat = Some(downbeat.timestamp_ms);
            }

            // Report the displayed tempo whenever it changes
            if let Some(bpm) = shown
                && last_shown != Some(bpm)
            {
                println!("🎵 Tempo: {:.1} BPM (playback rate {:.2})", bpm, playback);
                last_shown = Some(bpm);
            }

            t += TICK_MS;
        }
    }

    if let Some(bpm) = pipeline.detector().smoothed_bpm() {
        println!(
            "\n📊 Settled at {:.1} BPM, playback rate {:.2}",
            bpm,
            rate.last_rate()
        );
    }
}
