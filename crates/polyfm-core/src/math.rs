//! Tuning and output-stage helpers.
//!
//! All functions are allocation-free and suitable for `no_std`.

use libm::{powf, tanhf};

/// MIDI note number of the tuning reference (A4).
pub const A4_NOTE: u8 = 69;

/// Frequency of the tuning reference in Hz.
pub const A4_FREQ: f32 = 440.0;

/// Highest valid MIDI note number.
pub const MAX_NOTE: u8 = 127;

/// Convert a MIDI note number to frequency in Hz.
///
/// Twelve-tone equal temperament with A4 (note 69) = 440 Hz:
/// `440 · 2^((note - 69) / 12)`.
///
/// # Example
/// ```rust
/// use polyfm_core::midi_to_freq;
///
/// assert!((midi_to_freq(69) - 440.0).abs() < 1e-3);
/// assert!((midi_to_freq(81) - 880.0).abs() < 1e-3);
/// ```
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    A4_FREQ * powf(2.0, (f32::from(note) - f32::from(A4_NOTE)) / 12.0)
}

/// Soft clip using hyperbolic tangent.
///
/// Smooth saturation that approaches ±1 asymptotically. The engine never
/// limits its own output; consumers may apply this before writing samples.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Flush subnormal floats to zero.
///
/// Replaces values below 1e-20 with zero, well before the IEEE 754
/// subnormal range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq_reference_points() {
        let cases = [(69_u8, 440.0_f32), (81, 880.0), (57, 220.0), (60, 261.6256)];
        for (note, expected) in cases {
            let freq = midi_to_freq(note);
            assert!(
                (freq - expected).abs() < 0.01,
                "note {} should be {} Hz, got {}",
                note,
                expected,
                freq
            );
        }
    }

    #[test]
    fn test_midi_to_freq_extremes_are_finite() {
        let low = midi_to_freq(0);
        let high = midi_to_freq(MAX_NOTE);
        assert!((low - 8.1758).abs() < 0.001, "note 0: {}", low);
        assert!((high - 12543.85).abs() < 0.1, "note 127: {}", high);
    }

    #[test]
    fn test_soft_clip_bounds() {
        assert!(soft_clip(0.0).abs() < 1e-6);
        assert!(soft_clip(10.0) <= 1.0);
        assert!(soft_clip(-10.0) >= -1.0);
        assert!((soft_clip(0.1) - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-30), 0.0);
        assert_eq!(flush_denormal(-1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
