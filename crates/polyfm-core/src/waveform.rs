//! Stateless waveform library.
//!
//! Every oscillator in the engine (unison carriers and the FM modulator)
//! goes through [`evaluate`]. A waveform is a closed tag, not a function
//! pointer, so the hot path is a single `match`.
//!
//! | Index | Waveform | Shape over one cycle |
//! |-------|----------|----------------------|
//! | 0 | [`Waveform::Sine`] | `sin(2π·p)` |
//! | 1 | [`Waveform::Triangle`] | 0 → 1 → -1 → 0, linear segments |
//! | 2 | [`Waveform::Square`] | +1 for `p < 0.5`, -1 otherwise |
//! | 3 | [`Waveform::Saw`] | `2p - 1` |
//!
//! The waveforms are naive (not band-limited). Square and saw are
//! discontinuous by definition; sine and triangle are continuous.

use core::f32::consts::TAU;
use core::fmt;
use core::str::FromStr;
use libm::{floorf, sinf};

/// Wrap a phase into `[0, 1)`.
///
/// Works for negative and multi-cycle inputs.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - floorf(phase);
    // floorf can round `phase - floor` up to exactly 1.0 for tiny negatives
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Oscillator waveform selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Sine waveform: pure fundamental tone.
    #[default]
    Sine,
    /// Triangle waveform: odd harmonics, softer than saw.
    Triangle,
    /// Square waveform (50% duty cycle): odd harmonics, hollow timbre.
    Square,
    /// Sawtooth waveform: all harmonics, bright timbre.
    Saw,
}

impl Waveform {
    /// All waveforms in index order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::Saw,
    ];

    /// Look up a waveform by its selector index (0..=3).
    ///
    /// Returns `None` for any other index; callers keep their previous
    /// selection in that case.
    #[inline]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Selector index of this waveform.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Waveform::Sine => 0,
            Waveform::Triangle => 1,
            Waveform::Square => 2,
            Waveform::Saw => 3,
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
        }
    }

    /// Amplitude at `phase`. See [`evaluate`].
    #[inline]
    pub fn evaluate(self, phase: f32) -> f32 {
        evaluate(self, phase)
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a waveform name is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown waveform (expected sine, triangle, square or saw)")]
pub struct ParseWaveformError;

impl FromStr for Waveform {
    type Err = ParseWaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Waveform::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s))
            .or_else(|| match s {
                "sin" => Some(Waveform::Sine),
                "tri" => Some(Waveform::Triangle),
                "sqr" => Some(Waveform::Square),
                "sawtooth" => Some(Waveform::Saw),
                _ => None,
            })
            .ok_or(ParseWaveformError)
    }
}

/// Evaluate `waveform` at `phase`, returning an amplitude in `[-1, 1]`.
///
/// The phase is taken modulo 1 first, so any finite input is valid.
///
/// # Example
///
/// ```rust
/// use polyfm_core::{Waveform, evaluate};
///
/// assert!((evaluate(Waveform::Sine, 0.25) - 1.0).abs() < 1e-6);
/// assert_eq!(evaluate(Waveform::Square, 1.75), -1.0);
/// assert_eq!(evaluate(Waveform::Saw, 0.5), 0.0);
/// ```
#[inline]
pub fn evaluate(waveform: Waveform, phase: f32) -> f32 {
    let p = wrap_phase(phase);
    match waveform {
        Waveform::Sine => sinf(p * TAU),
        Waveform::Triangle => {
            if p < 0.25 {
                4.0 * p
            } else if p < 0.75 {
                2.0 - 4.0 * p
            } else {
                4.0 * p - 4.0
            }
        }
        Waveform::Square => {
            if p < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Saw => 2.0 * p - 1.0,
    }
}
