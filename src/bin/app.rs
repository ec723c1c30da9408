use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gesture_tempo::{RateMapper, Recording, SeparationLevel, TempoPipeline, TrackingConfig};
use itertools::Itertools;
use ringbuffer::{AllocRingBuffer, RingBuffer};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Parser, Debug)]
struct Args {
    /// Recorded tracking session to replay (JSON)
    recording: PathBuf,
    /// Tracking configuration file (JSON), defaults apply when omitted
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TrackingConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => TrackingConfig::default(),
    };

    let recording = Recording::load(&args.recording)
        .with_context(|| format!("failed to load recording from {}", args.recording.display()))?;
    recording.validate()?;

    tracing::info!(
        "Replaying {} frames spanning {:.1} s",
        recording.len(),
        recording.duration_ms() / 1000.0
    );

    let mut pipeline = TempoPipeline::new(config.beat);
    let mut rate = RateMapper::new();
    let mut separation = SeparationLevel::new(config.separation);

    let mut readings = AllocRingBuffer::new(256);
    let mut last_shown = None;

    for frame in recording.frames() {
        let bpm = pipeline.tick(frame.tempo_sample(), frame.timestamp_ms);
        let playback_rate = rate.compute(bpm);
        let level = separation.observe(frame.left, frame.right);

        readings.extend(bpm);

        if let Some(shown) = bpm
            && last_shown != Some(shown)
        {
            tracing::info!(
                "t={:>8.0} ms  {:>5.1} BPM  rate {:.2}  separation {}",
                frame.timestamp_ms,
                shown,
                playback_rate,
                level.map_or_else(|| "--".to_string(), |level| format!("{level:.2}")),
            );
            last_shown = Some(shown);
        }
    }

    let histogram = readings
        .iter()
        .map(|bpm| (bpm.round() as i32, *bpm))
        .into_group_map();

    let mut histogram = histogram
        .into_iter()
        .map(|(bpm, values)| (bpm, values.len()))
        .collect::<Vec<_>>();
    histogram.sort_by_key(|(bpm, _)| *bpm);

    if histogram.is_empty() {
        tracing::info!("No tempo detected in this recording");
    } else {
        println!();
        for (bpm, count) in &histogram {
            println!("{bpm:>4} BPM {}", "#".repeat((*count).min(60)));
        }
        if let Some((bpm, _)) = histogram.iter().max_by_key(|(_, count)| *count) {
            println!("\nDominant tempo: {bpm} BPM");
        }
    }

    tracing::info!("Final playback rate: {:.2}", rate.last_rate());

    Ok(())
}
