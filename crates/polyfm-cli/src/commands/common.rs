//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use polyfm_config::{EngineConfig, ParamsConfig};
use polyfm_synth::{NoteEvent, Synth, SynthError, SynthHandle, synth};
use std::path::PathBuf;
use std::time::Duration;

/// Simultaneous voices in the CLI engine.
pub const POLYPHONY: usize = 16;

/// Extra time rendered after the release segment so the tail reaches silence.
const TAIL_PADDING_SECS: f64 = 0.05;

/// Attempts before a full event queue is reported as an error.
const QUEUE_RETRIES: u32 = 100;

/// Engine configuration options shared by `render`, `play` and `config`.
#[derive(Args, Debug, Default)]
pub struct EngineArgs {
    /// Engine configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the sample rate
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Apply a tanh soft clip to the output
    #[arg(long)]
    pub soft_clip: bool,

    /// Override a synthesis parameter (e.g., "carrier=square")
    #[arg(long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

impl EngineArgs {
    /// Load the configuration file (or defaults) and apply command-line overrides.
    pub fn load(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
        if self.soft_clip {
            config.soft_clip = true;
        }
        for (key, value) in &self.params {
            apply_param(&mut config.params, key, value)?;
        }
        Ok(config)
    }
}

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) => Ok((key.trim().to_string(), value.trim().to_string())),
        None => Err(format!(
            "Invalid parameter format: '{}' (expected key=value)",
            s
        )),
    }
}

/// Set one `[params]` field from its textual form.
///
/// Values are range-checked later, when the engine is built.
pub fn apply_param(params: &mut ParamsConfig, key: &str, value: &str) -> anyhow::Result<()> {
    let number = || -> anyhow::Result<f32> {
        value
            .parse::<f32>()
            .with_context(|| format!("parameter '{}': '{}' is not a number", key, value))
    };

    match key {
        "volume" => params.volume = number()?,
        "unison_variance" => params.unison_variance = number()?,
        "modulator_amount" => params.modulator_amount = number()?,
        "modulator_ratio" => params.modulator_ratio = Some(number()?),
        "modulator_ratio_step" => {
            params.modulator_ratio_step = value
                .parse()
                .with_context(|| format!("parameter '{}': '{}' is not a step", key, value))?;
            params.modulator_ratio = None;
        }
        "carrier" => params.carrier = value.to_string(),
        "modulator" => params.modulator = value.to_string(),
        _ => anyhow::bail!(
            "Unknown parameter '{}'. Known: volume, unison_variance, modulator_amount, \
             modulator_ratio, modulator_ratio_step, carrier, modulator",
            key
        ),
    }
    Ok(())
}

/// Build the engine pair for a validated configuration.
pub fn build_synth(config: &EngineConfig) -> anyhow::Result<(SynthHandle, Synth<POLYPHONY>)> {
    let synth_config = config.synth_config()?;
    Ok(synth::<POLYPHONY>(&synth_config)?)
}

/// Seconds to keep rendering after the last score event.
pub fn release_tail(config: &EngineConfig) -> f64 {
    f64::from(config.params.envelope_durations[2]) + TAIL_PADDING_SECS
}

/// Queue an event, waiting briefly while the audio thread drains a full queue.
pub fn send_with_retry(handle: &mut SynthHandle, event: NoteEvent) -> anyhow::Result<()> {
    for _ in 0..QUEUE_RETRIES {
        match handle.send(event) {
            Err(SynthError::QueueFull) => std::thread::sleep(Duration::from_millis(1)),
            result => return Ok(result?),
        }
    }
    anyhow::bail!(
        "Event queue stayed full; note {} was not delivered",
        event.note
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("carrier = square").unwrap(),
            ("carrier".to_string(), "square".to_string())
        );
        assert!(parse_key_val("volume").is_err());
    }

    #[test]
    fn test_apply_param() {
        let mut params = ParamsConfig::default();
        apply_param(&mut params, "volume", "0.25").unwrap();
        apply_param(&mut params, "modulator_ratio", "3").unwrap();
        apply_param(&mut params, "carrier", "square").unwrap();
        assert_eq!(params.volume, 0.25);
        assert_eq!(params.effective_ratio().unwrap(), 3.0);
        assert_eq!(params.carrier, "square");

        apply_param(&mut params, "modulator_ratio_step", "7").unwrap();
        assert_eq!(params.effective_ratio().unwrap(), 4.0);

        assert!(apply_param(&mut params, "volume", "loud").is_err());
        assert!(apply_param(&mut params, "cutoff", "1000").is_err());
    }

    #[test]
    fn test_engine_args_overrides() {
        let args = EngineArgs {
            sample_rate: Some(44100),
            soft_clip: true,
            params: vec![("modulator_amount".to_string(), "0.02".to_string())],
            ..EngineArgs::default()
        };
        let config = args.load().unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert!(config.soft_clip);
        assert_eq!(config.params.modulator_amount, 0.02);
    }

    #[test]
    fn test_build_rejects_bad_override() {
        let mut config = EngineConfig::default();
        apply_param(&mut config.params, "volume", "2.0").unwrap();
        assert!(build_synth(&config).is_err());
    }

    #[test]
    fn test_release_tail() {
        let mut config = EngineConfig::default();
        config.params.envelope_durations[2] = 1.0;
        assert!((release_tail(&config) - 1.05).abs() < 1e-6);
    }

    #[test]
    fn test_send_reports_invalid_note() {
        let (mut handle, _engine) = build_synth(&EngineConfig::default()).unwrap();
        assert!(send_with_retry(&mut handle, NoteEvent::on(60, 100)).is_ok());
        assert!(send_with_retry(&mut handle, NoteEvent::on(200, 100)).is_err());
    }
}
