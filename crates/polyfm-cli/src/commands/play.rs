//! Real-time score playback command.

use super::common::{EngineArgs, build_synth, release_tail, send_with_retry};
use anyhow::Context;
use clap::Args;
use polyfm_config::Score;
use polyfm_io::{OutputConfig, OutputStream, soft_clip_buffer};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest sleep between checks of the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Args)]
pub struct PlayArgs {
    /// Score file (TOML)
    #[arg(value_name = "SCORE")]
    score: PathBuf,

    /// Output device index or name (see `polyfm devices`)
    #[arg(long)]
    device: Option<String>,

    /// Buffer size in frames (host default if omitted)
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Repeat the score until stopped
    #[arg(long = "loop")]
    repeat: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let config = args.engine.load()?;
    let score = Score::load(&args.score)
        .with_context(|| format!("loading score {}", args.score.display()))?;
    let (mut handle, mut engine) = build_synth(&config)?;

    let soft_clip = config.soft_clip;
    let output_config = OutputConfig {
        sample_rate: config.sample_rate,
        buffer_size: args.buffer_size,
        device: args.device,
    };
    let stream = OutputStream::open(&output_config, move |data, channels| {
        engine.render_interleaved(data, channels);
        if soft_clip {
            soft_clip_buffer(data);
        }
    })?;

    let length = score.length(release_tail(&config));
    println!("Playing {}", args.score.display());
    println!("  Output: {}", stream.device_name());
    println!(
        "  {} events, {:.2}s at {} Hz, {} channel(s)",
        score.events.len(),
        length,
        stream.sample_rate(),
        stream.channels()
    );
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    loop {
        let start = Instant::now();
        for event in &score.events {
            if !wait_until(start + Duration::from_secs_f64(event.time), &running) {
                break;
            }
            send_with_retry(&mut handle, event.note_event())?;
        }
        wait_until(start + Duration::from_secs_f64(length), &running);

        if !(args.repeat && running.load(Ordering::SeqCst)) {
            break;
        }
        // Notes held past the end of the score must not pile up across passes
        handle.all_notes_off()?;
    }

    drop(stream);
    println!("Done!");
    Ok(())
}

/// Sleep until `deadline`, returning `false` early if `running` is cleared.
fn wait_until(deadline: Instant, running: &AtomicBool) -> bool {
    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(POLL_INTERVAL));
    }
}
