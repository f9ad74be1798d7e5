//! Lock-free parameter surface shared by the control and audio threads.
//!
//! Each parameter lives in its own atomic (`f32` values as their bit
//! pattern in an `AtomicU32`, waveform selectors as an `AtomicU8`). Setters
//! validate before storing, so the audio thread never sees an out-of-domain
//! value; [`ParamSurface::snapshot`] loads every field once per sample into
//! a plain [`SynthParams`] copy.
//!
//! Fields are individually consistent. Two fields written together may be
//! seen one sample apart, which is inaudible for slider gestures.

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use polyfm_core::Waveform;

use crate::envelope::{EnvelopeShape, SEGMENTS, check_duration, check_level};
use crate::error::{Result, SynthError};

/// Largest accepted unison variance (fractional detune).
pub const MAX_UNISON_VARIANCE: f32 = 0.1;

/// Largest accepted FM depth (fraction of carrier frequency).
pub const MAX_MODULATOR_AMOUNT: f32 = 0.1;

/// A consistent copy of every synthesis parameter, read once per sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthParams {
    /// Master gain, `[0, 1]`.
    pub volume: f32,
    /// Maximum fractional detune per unison unit, `[0, 0.1]`.
    pub unison_variance: f32,
    /// Envelope breakpoints.
    pub envelope: EnvelopeShape,
    /// FM depth as a fraction of the carrier frequency, `[0, 0.1]`.
    pub modulator_amount: f32,
    /// Modulator frequency as a multiple of the note frequency, `> 0`.
    pub modulator_ratio: f32,
    /// Waveform of the unison carriers.
    pub carrier: Waveform,
    /// Waveform of the modulator.
    pub modulator: Waveform,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            volume: 0.5,
            unison_variance: 0.01,
            envelope: EnvelopeShape::default(),
            modulator_amount: 0.0,
            modulator_ratio: 1.0,
            carrier: Waveform::Saw,
            modulator: Waveform::Sine,
        }
    }
}

impl SynthParams {
    /// Check every field against its domain.
    pub fn validate(&self) -> Result<()> {
        check_volume(self.volume)?;
        check_variance(self.unison_variance)?;
        self.envelope.validate()?;
        check_amount(self.modulator_amount)?;
        check_ratio(self.modulator_ratio)?;
        Ok(())
    }
}

fn check_range(param: &'static str, value: f32, max: f32) -> Result<f32> {
    if (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(SynthError::ParamOutOfRange { param, value })
    }
}

fn check_volume(value: f32) -> Result<f32> {
    check_range("volume", value, 1.0)
}

fn check_variance(value: f32) -> Result<f32> {
    check_range("unison_variance", value, MAX_UNISON_VARIANCE)
}

fn check_amount(value: f32) -> Result<f32> {
    check_range("modulator_amount", value, MAX_MODULATOR_AMOUNT)
}

fn check_ratio(value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SynthError::ParamOutOfRange {
            param: "modulator_ratio",
            value,
        })
    }
}

fn check_segment(index: usize) -> Result<usize> {
    if index < SEGMENTS {
        Ok(index)
    } else {
        Err(SynthError::EnvelopeSegmentOutOfRange(index))
    }
}

#[inline]
fn store(slot: &AtomicU32, value: f32) {
    slot.store(value.to_bits(), Ordering::Release);
}

#[inline]
fn load(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Acquire))
}

fn atomic(value: f32) -> AtomicU32 {
    AtomicU32::new(value.to_bits())
}

/// Thread-safe parameter storage.
///
/// Shared between threads behind an `Arc`. All methods take `&self`; a
/// rejected setter leaves the previous value in effect.
///
/// # Example
///
/// ```rust
/// use polyfm_core::Waveform;
/// use polyfm_synth::ParamSurface;
///
/// let params = ParamSurface::new();
/// params.set_volume(0.8).unwrap();
/// params.set_carrier_index(1).unwrap();
/// assert!(params.set_modulator_index(7).is_err());
///
/// let snapshot = params.snapshot();
/// assert_eq!(snapshot.volume, 0.8);
/// assert_eq!(snapshot.carrier, Waveform::Triangle);
/// assert_eq!(snapshot.modulator, Waveform::Sine);
/// ```
#[derive(Debug)]
pub struct ParamSurface {
    volume: AtomicU32,
    unison_variance: AtomicU32,
    envelope_values: [AtomicU32; SEGMENTS],
    envelope_durations: [AtomicU32; SEGMENTS],
    modulator_amount: AtomicU32,
    modulator_ratio: AtomicU32,
    carrier: AtomicU8,
    modulator: AtomicU8,
}

impl Default for ParamSurface {
    fn default() -> Self {
        Self::from_valid(&SynthParams::default())
    }
}

impl ParamSurface {
    /// Create a surface holding the default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface holding `params`, rejecting any out-of-domain field.
    pub fn with_params(params: &SynthParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::from_valid(params))
    }

    fn from_valid(params: &SynthParams) -> Self {
        Self {
            volume: atomic(params.volume),
            unison_variance: atomic(params.unison_variance),
            envelope_values: params.envelope.values.map(atomic),
            envelope_durations: params.envelope.durations.map(atomic),
            modulator_amount: atomic(params.modulator_amount),
            modulator_ratio: atomic(params.modulator_ratio),
            carrier: AtomicU8::new(params.carrier.index()),
            modulator: AtomicU8::new(params.modulator.index()),
        }
    }

    /// Load every field into a plain copy. Called once per rendered sample.
    #[inline]
    pub fn snapshot(&self) -> SynthParams {
        SynthParams {
            volume: load(&self.volume),
            unison_variance: load(&self.unison_variance),
            envelope: EnvelopeShape {
                values: [
                    load(&self.envelope_values[0]),
                    load(&self.envelope_values[1]),
                    load(&self.envelope_values[2]),
                ],
                durations: [
                    load(&self.envelope_durations[0]),
                    load(&self.envelope_durations[1]),
                    load(&self.envelope_durations[2]),
                ],
            },
            modulator_amount: load(&self.modulator_amount),
            modulator_ratio: load(&self.modulator_ratio),
            // Only valid indices are ever stored
            carrier: Waveform::from_index(self.carrier.load(Ordering::Acquire)).unwrap_or_default(),
            modulator: Waveform::from_index(self.modulator.load(Ordering::Acquire))
                .unwrap_or_default(),
        }
    }

    /// Store every field of `params` after validating all of them.
    pub fn apply(&self, params: &SynthParams) -> Result<()> {
        params.validate()?;
        store(&self.volume, params.volume);
        store(&self.unison_variance, params.unison_variance);
        self.store_envelope(&params.envelope);
        store(&self.modulator_amount, params.modulator_amount);
        store(&self.modulator_ratio, params.modulator_ratio);
        self.carrier.store(params.carrier.index(), Ordering::Release);
        self.modulator.store(params.modulator.index(), Ordering::Release);
        Ok(())
    }

    /// Set master volume, `[0, 1]`.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        store(&self.volume, check_volume(volume)?);
        Ok(())
    }

    /// Set maximum unison detune, `[0, 0.1]`.
    pub fn set_unison_variance(&self, variance: f32) -> Result<()> {
        store(&self.unison_variance, check_variance(variance)?);
        Ok(())
    }

    /// Set the target level of envelope segment `index` (0 attack, 1 decay, 2 release).
    pub fn set_envelope_value(&self, index: usize, value: f32) -> Result<()> {
        let index = check_segment(index)?;
        store(&self.envelope_values[index], check_level(value)?);
        Ok(())
    }

    /// Set the duration in seconds of envelope segment `index`.
    pub fn set_envelope_duration(&self, index: usize, seconds: f32) -> Result<()> {
        let index = check_segment(index)?;
        store(&self.envelope_durations[index], check_duration(seconds)?);
        Ok(())
    }

    /// Replace the whole envelope shape.
    pub fn set_envelope(&self, shape: &EnvelopeShape) -> Result<()> {
        shape.validate()?;
        self.store_envelope(shape);
        Ok(())
    }

    fn store_envelope(&self, shape: &EnvelopeShape) {
        for (slot, &value) in self.envelope_values.iter().zip(&shape.values) {
            store(slot, value);
        }
        for (slot, &duration) in self.envelope_durations.iter().zip(&shape.durations) {
            store(slot, duration);
        }
    }

    /// Set FM depth, `[0, 0.1]`.
    pub fn set_modulator_amount(&self, amount: f32) -> Result<()> {
        store(&self.modulator_amount, check_amount(amount)?);
        Ok(())
    }

    /// Set modulator frequency ratio, `> 0`.
    pub fn set_modulator_ratio(&self, ratio: f32) -> Result<()> {
        store(&self.modulator_ratio, check_ratio(ratio)?);
        Ok(())
    }

    /// Select the carrier waveform.
    pub fn set_carrier(&self, waveform: Waveform) {
        self.carrier.store(waveform.index(), Ordering::Release);
    }

    /// Select the modulator waveform.
    pub fn set_modulator(&self, waveform: Waveform) {
        self.modulator.store(waveform.index(), Ordering::Release);
    }

    /// Select the carrier waveform by selector index (0 sine, 1 triangle, 2 square, 3 saw).
    pub fn set_carrier_index(&self, index: u8) -> Result<()> {
        let waveform = Waveform::from_index(index).ok_or(SynthError::UnknownWaveform(index))?;
        self.set_carrier(waveform);
        Ok(())
    }

    /// Select the modulator waveform by selector index.
    pub fn set_modulator_index(&self, index: u8) -> Result<()> {
        let waveform = Waveform::from_index(index).ok_or(SynthError::UnknownWaveform(index))?;
        self.set_modulator(waveform);
        Ok(())
    }
}
