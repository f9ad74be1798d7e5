//! Property-based tests for polyfm-core primitives.
//!
//! Tests waveform bounds and periodicity, tuning monotonicity and ramp
//! timing using proptest for randomized input generation.

use polyfm_core::{LinearRamp, Waveform, evaluate, midi_to_freq, wrap_phase};
use proptest::prelude::*;

fn any_waveform() -> impl Strategy<Value = Waveform> {
    (0u8..4).prop_map(|i| Waveform::from_index(i).unwrap_or_default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every waveform stays in [-1, 1] for any finite phase, including
    /// negative and multi-cycle phases.
    #[test]
    fn waveform_output_bounded(
        waveform in any_waveform(),
        phase in -1000.0f32..1000.0f32,
    ) {
        let out = evaluate(waveform, phase);
        prop_assert!(
            (-1.0..=1.0).contains(&out),
            "{} at phase {} produced {}", waveform, phase, out
        );
    }

    /// Phase wrapping always lands in [0, 1).
    #[test]
    fn wrapped_phase_in_unit_interval(phase in -1.0e6f32..1.0e6f32) {
        let p = wrap_phase(phase);
        prop_assert!((0.0..1.0).contains(&p), "wrap_phase({}) = {}", phase, p);
    }

    /// Adding whole cycles does not change the output of continuous waveforms.
    #[test]
    fn waveform_periodic(
        waveform in any_waveform(),
        phase in 0.0f32..1.0f32,
        cycles in 1i32..8,
    ) {
        // Square and saw jump at the wrap point; stay clear of it so
        // float rounding cannot flip a side.
        prop_assume!(phase > 0.001 && phase < 0.999 && (phase - 0.5).abs() > 0.001);
        let a = evaluate(waveform, phase);
        let b = evaluate(waveform, phase + cycles as f32);
        prop_assert!((a - b).abs() < 1e-4, "{}: {} vs {}", waveform, a, b);
    }

    /// Higher notes always have higher frequencies, and one octave up doubles.
    #[test]
    fn note_frequency_monotonic(note in 0u8..115) {
        let f0 = midi_to_freq(note);
        let f1 = midi_to_freq(note + 1);
        let octave = midi_to_freq(note + 12);
        prop_assert!(f1 > f0);
        prop_assert!((octave / f0 - 2.0).abs() < 1e-4, "octave ratio {}", octave / f0);
    }

    /// A linear ramp reaches its target in exactly the requested number of
    /// samples and never overshoots on the way.
    #[test]
    fn ramp_reaches_target_exactly(
        start in -1.0f32..1.0f32,
        target in -1.0f32..1.0f32,
        samples in 1u32..2000,
    ) {
        let mut ramp = LinearRamp::new(start);
        ramp.ramp_to(target, samples);
        let (lo, hi) = if start < target { (start, target) } else { (target, start) };
        for _ in 0..samples {
            let v = ramp.advance();
            prop_assert!(v >= lo - 1e-3 && v <= hi + 1e-3, "{} outside [{}, {}]", v, lo, hi);
        }
        prop_assert!(ramp.is_settled());
        prop_assert_eq!(ramp.get(), target);
    }
}
