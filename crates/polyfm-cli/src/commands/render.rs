//! Offline score rendering command.

use super::common::{EngineArgs, build_synth, release_tail, send_with_retry};
use anyhow::Context;
use clap::Args;
use polyfm_config::Score;
use polyfm_io::{WavSpec, soft_clip_buffer, write_wav_stereo};
use polyfm_synth::{Synth, SynthHandle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Score file (TOML)
    #[arg(value_name = "SCORE")]
    score: PathBuf,

    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Length in seconds (default: score duration, or last event plus release)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Output bit depth (16, 24 or 32-bit float)
    #[arg(long, default_value = "32")]
    bits: u16,

    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !matches!(args.bits, 16 | 24 | 32) {
        anyhow::bail!("Unsupported bit depth {} (use 16, 24 or 32)", args.bits);
    }
    if let Some(d) = args.duration.filter(|d| !(d.is_finite() && *d > 0.0)) {
        anyhow::bail!("Duration must be a positive number of seconds, got {}", d);
    }

    let config = args.engine.load()?;
    let score = Score::load(&args.score)
        .with_context(|| format!("loading score {}", args.score.display()))?;
    let (mut handle, mut engine) = build_synth(&config)?;

    let sample_rate = config.sample_rate;
    let length = args
        .duration
        .unwrap_or_else(|| score.length(release_tail(&config)));
    let total_frames = (length * f64::from(sample_rate)).round() as u64;

    println!("Rendering {}...", args.score.display());
    println!(
        "  {} events, {:.2}s at {} Hz",
        score.events.len(),
        length,
        sample_rate
    );

    let mut frames = render_score(&mut handle, &mut engine, &score, sample_rate, total_frames)?;

    if config.soft_clip {
        soft_clip_buffer(&mut frames);
    }

    let peak = frames.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 1.0 {
        tracing::warn!(peak, "output exceeds full scale; lower the volume or use --soft-clip");
    }

    let spec = WavSpec {
        sample_rate,
        bits_per_sample: args.bits,
    };
    write_wav_stereo(&args.output, &frames, spec)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} frames to {} (peak {:.3})",
        total_frames,
        args.output.display(),
        peak
    );
    Ok(())
}

/// Render `total_frames` interleaved stereo frames, sending each score event
/// just before the frame it is due on.
pub fn render_score<const N: usize>(
    handle: &mut SynthHandle,
    engine: &mut Synth<N>,
    score: &Score,
    sample_rate: u32,
    total_frames: u64,
) -> anyhow::Result<Vec<f32>> {
    let mut frames = Vec::with_capacity(total_frames as usize * 2);
    let mut events = score.events.iter().peekable();
    for frame in 0..total_frames {
        while let Some(event) = events.next_if(|e| e.frame(sample_rate) <= frame) {
            send_with_retry(handle, event.note_event())?;
        }
        let (left, right) = engine.render_frame();
        frames.push(left);
        frames.push(right);
    }

    let skipped = events.count();
    if skipped > 0 {
        tracing::warn!(skipped, "score events after the end of the render were dropped");
    }
    Ok(frames)
}
