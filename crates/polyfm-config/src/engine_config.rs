//! Engine configuration file.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! sample_rate = 48000
//! unison_voices = 4
//! queue_capacity = 1024
//! soft_clip = false
//!
//! [params]
//! volume = 0.5
//! unison_variance = 0.01
//! envelope_values = [1.0, 0.7, 0.0]
//! envelope_durations = [0.1, 0.2, 0.5]
//! modulator_amount = 0.0
//! modulator_ratio_step = 4   # 0..=10, ratio = 2^(step - 5)
//! # modulator_ratio = 1.5    # overrides the step when present
//! carrier = "saw"
//! modulator = "sine"
//! ```

use std::path::Path;

use polyfm_core::Waveform;
use polyfm_synth::{EnvelopeShape, ParamSurface, SynthConfig, SynthParams};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Highest position of the modulator ratio slider.
pub const MAX_RATIO_STEP: u8 = 10;

/// Slider position that maps to a ratio of 1.
pub const UNITY_RATIO_STEP: u8 = 5;

/// Map a ratio slider position to a modulator ratio.
///
/// Each step above [`UNITY_RATIO_STEP`] doubles the ratio and each step
/// below halves it, so the slider spans 1/32 to 32.
///
/// ```rust
/// use polyfm_config::modulator_ratio_from_step;
///
/// assert_eq!(modulator_ratio_from_step(5), 1.0);
/// assert_eq!(modulator_ratio_from_step(4), 0.5);
/// assert_eq!(modulator_ratio_from_step(7), 4.0);
/// ```
pub fn modulator_ratio_from_step(step: u8) -> f32 {
    let mut ratio = 1.0f32;
    for _ in step..UNITY_RATIO_STEP {
        ratio *= 0.5;
    }
    for _ in UNITY_RATIO_STEP..step {
        ratio *= 2.0;
    }
    ratio
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_unison_voices() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_seed() -> u32 {
    SynthConfig::default().seed
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Unison carriers per voice (1-16).
    #[serde(default = "default_unison_voices")]
    pub unison_voices: usize,

    /// Capacity of the note event queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Apply a tanh soft clip to the summed output.
    #[serde(default)]
    pub soft_clip: bool,

    /// Seed for unison detune draws.
    #[serde(default = "default_seed")]
    pub seed: u32,

    /// Initial synthesis parameters.
    #[serde(default)]
    pub params: ParamsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            unison_voices: default_unison_voices(),
            queue_capacity: default_queue_capacity(),
            soft_clip: false,
            seed: default_seed(),
            params: ParamsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build the engine construction settings, validating everything.
    pub fn synth_config(&self) -> Result<SynthConfig, ConfigError> {
        let config = SynthConfig {
            sample_rate: self.sample_rate as f32,
            unison_voices: self.unison_voices,
            queue_capacity: self.queue_capacity,
            seed: self.seed,
            params: self.params.synth_params()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Store the configured parameters into a live parameter surface.
    ///
    /// Nothing is stored unless every parameter is valid.
    pub fn apply(&self, surface: &ParamSurface) -> Result<(), ConfigError> {
        surface.apply(&self.params.synth_params()?)?;
        Ok(())
    }
}

/// Synthesis parameters as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsConfig {
    /// Master gain, 0-1.
    pub volume: f32,
    /// Maximum fractional unison detune, 0-0.1.
    pub unison_variance: f32,
    /// Attack, decay and release target levels.
    pub envelope_values: [f32; 3],
    /// Attack, decay and release durations in seconds.
    pub envelope_durations: [f32; 3],
    /// FM depth, 0-0.1.
    pub modulator_amount: f32,
    /// Ratio slider position, 0-10.
    pub modulator_ratio_step: u8,
    /// Explicit ratio, overriding `modulator_ratio_step`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modulator_ratio: Option<f32>,
    /// Carrier waveform name.
    pub carrier: String,
    /// Modulator waveform name.
    pub modulator: String,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        let params = SynthParams::default();
        Self {
            volume: params.volume,
            unison_variance: params.unison_variance,
            envelope_values: params.envelope.values,
            envelope_durations: params.envelope.durations,
            modulator_amount: params.modulator_amount,
            modulator_ratio_step: 4,
            modulator_ratio: None,
            carrier: params.carrier.name().to_string(),
            modulator: params.modulator.name().to_string(),
        }
    }
}

impl ParamsConfig {
    /// The modulator ratio in effect: the explicit value, else the slider mapping.
    pub fn effective_ratio(&self) -> Result<f32, ConfigError> {
        match self.modulator_ratio {
            Some(ratio) => Ok(ratio),
            None if self.modulator_ratio_step <= MAX_RATIO_STEP => {
                Ok(modulator_ratio_from_step(self.modulator_ratio_step))
            }
            None => Err(ConfigError::invalid_parameter(
                "modulator_ratio_step",
                format!(
                    "{} is above the maximum of {}",
                    self.modulator_ratio_step, MAX_RATIO_STEP
                ),
            )),
        }
    }

    /// Convert to engine parameters, validating every field.
    pub fn synth_params(&self) -> Result<SynthParams, ConfigError> {
        let params = SynthParams {
            volume: self.volume,
            unison_variance: self.unison_variance,
            envelope: EnvelopeShape {
                values: self.envelope_values,
                durations: self.envelope_durations,
            },
            modulator_amount: self.modulator_amount,
            modulator_ratio: self.effective_ratio()?,
            carrier: parse_waveform("carrier", &self.carrier)?,
            modulator: parse_waveform("modulator", &self.modulator)?,
        };
        params.validate()?;
        Ok(params)
    }
}

fn parse_waveform(param: &str, name: &str) -> Result<Waveform, ConfigError> {
    name.parse()
        .map_err(|e| ConfigError::invalid_parameter(param, format!("'{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyfm_synth::SynthError;

    #[test]
    fn test_ratio_steps() {
        let expected = [
            1.0 / 32.0,
            1.0 / 16.0,
            0.125,
            0.25,
            0.5,
            1.0,
            2.0,
            4.0,
            8.0,
            16.0,
            32.0,
        ];
        for (step, &ratio) in expected.iter().enumerate() {
            assert_eq!(modulator_ratio_from_step(step as u8), ratio, "step {}", step);
        }
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        let params = config.params.synth_params().unwrap();
        assert_eq!(params.modulator_ratio, 0.5);
        assert_eq!(params.carrier, Waveform::Saw);
        assert_eq!(params.modulator, Waveform::Sine);
    }

    #[test]
    fn test_partial_params() {
        let config = EngineConfig::from_toml(
            r#"
            sample_rate = 44100
            soft_clip = true

            [params]
            volume = 0.9
            carrier = "Square"
            modulator_ratio = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert!(config.soft_clip);
        assert_eq!(config.unison_voices, 4);

        let synth = config.synth_config().unwrap();
        assert_eq!(synth.sample_rate, 44100.0);
        assert_eq!(synth.params.volume, 0.9);
        assert_eq!(synth.params.carrier, Waveform::Square);
        assert_eq!(synth.params.modulator_ratio, 1.5);
        assert_eq!(synth.params.unison_variance, 0.01);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = EngineConfig::from_toml("[params]\nvolum = 0.3\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)), "got {err:?}");
    }

    #[test]
    fn test_unknown_waveform_rejected() {
        let config = EngineConfig::from_toml("[params]\nmodulator = \"buzz\"\n").unwrap();
        let err = config.synth_config().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidParameter { ref param, .. } if param == "modulator"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let config = EngineConfig::from_toml("[params]\nmodulator_amount = 0.5\n").unwrap();
        assert!(matches!(
            config.synth_config(),
            Err(ConfigError::Synth(SynthError::ParamOutOfRange {
                param: "modulator_amount",
                ..
            }))
        ));

        let config = EngineConfig::from_toml("[params]\nmodulator_ratio_step = 11\n").unwrap();
        assert!(matches!(
            config.synth_config(),
            Err(ConfigError::InvalidParameter { .. })
        ));

        let config = EngineConfig::from_toml("unison_voices = 0\n").unwrap();
        assert!(config.synth_config().is_err());
    }

    #[test]
    fn test_apply_to_surface() {
        let surface = ParamSurface::new();
        let mut config = EngineConfig::default();
        config.params.volume = 0.2;
        config.params.carrier = "triangle".to_string();
        config.apply(&surface).unwrap();
        let snapshot = surface.snapshot();
        assert_eq!(snapshot.volume, 0.2);
        assert_eq!(snapshot.carrier, Waveform::Triangle);

        config.params.volume = 3.0;
        assert!(config.apply(&surface).is_err());
        assert_eq!(surface.snapshot().volume, 0.2);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.params.modulator_ratio = Some(3.0);
        config.params.envelope_durations = [0.01, 1.0, 2.5];
        let text = config.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml(&text).unwrap(), config);
    }
}
