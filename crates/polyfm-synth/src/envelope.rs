//! Three-segment piecewise-linear envelope generator.
//!
//! An [`EnvelopeShape`] holds three `(value, duration)` breakpoints:
//!
//! ```text
//! level
//!   v0 |   /\
//!      |  /  \____________ v1 (held until note-off)
//!      | /                 \
//!   v2 |/                   \____
//!      +--------------------------- time
//!       d0  d1     sustain   d2
//! ```
//!
//! - Attack ramps from the start level (0 for a fresh note) to `values[0]`
//!   over `durations[0]` seconds.
//! - Decay ramps `values[0]` to `values[1]` over `durations[1]`, then holds.
//! - Release ramps from whatever level was current at note-off to
//!   `values[2]` over `durations[2]`, then the envelope goes idle.
//!
//! The shape is shared by every voice and only read here; each voice owns
//! one [`Envelope`] holding its stage, elapsed time and last output.

use crate::error::{Result, SynthError};

/// Number of breakpoints in an [`EnvelopeShape`].
pub const SEGMENTS: usize = 3;

/// Envelope breakpoints shared by all voices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeShape {
    /// Target level of attack, decay and release, each in `[0, 1]`.
    pub values: [f32; SEGMENTS],
    /// Segment durations in seconds, each `>= 0`. Zero means an instant jump.
    pub durations: [f32; SEGMENTS],
}

impl EnvelopeShape {
    /// Create a shape, validating every breakpoint.
    pub fn new(values: [f32; SEGMENTS], durations: [f32; SEGMENTS]) -> Result<Self> {
        let shape = Self { values, durations };
        shape.validate()?;
        Ok(shape)
    }

    /// Check values are in `[0, 1]` and durations are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for &value in &self.values {
            check_level(value)?;
        }
        for &duration in &self.durations {
            check_duration(duration)?;
        }
        Ok(())
    }
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            values: [1.0, 0.7, 0.0],
            durations: [0.1, 0.2, 0.5],
        }
    }
}

pub(crate) fn check_level(value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SynthError::ParamOutOfRange {
            param: "envelope_value",
            value,
        })
    }
}

pub(crate) fn check_duration(duration: f32) -> Result<f32> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(duration)
    } else {
        Err(SynthError::ParamOutOfRange {
            param: "envelope_duration",
            value: duration,
        })
    }
}

/// Envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Inactive, output is zero. The only stage in which a voice is reclaimed.
    #[default]
    Idle,
    /// Ramping from the start level toward `values[0]`.
    Attack,
    /// Ramping toward `values[1]`, then holding there until note-off.
    DecaySustain,
    /// Ramping from the note-off level toward `values[2]`.
    Release,
}

/// Per-voice envelope state.
///
/// # Example
///
/// ```rust
/// use polyfm_synth::{Envelope, EnvelopeShape, EnvelopeStage};
///
/// let shape = EnvelopeShape::default();
/// let dt = 1.0 / 48000.0;
/// let mut env = Envelope::new();
///
/// env.trigger();
/// assert_eq!(env.advance(&shape, dt), 0.0);
/// for _ in 0..48000 {
///     env.advance(&shape, dt);
/// }
/// assert_eq!(env.stage(), EnvelopeStage::DecaySustain);
/// assert!((env.level() - 0.7).abs() < 1e-6);
///
/// env.release();
/// assert_eq!(env.stage(), EnvelopeStage::Release);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    stage: EnvelopeStage,
    /// Seconds spent in the current stage
    elapsed: f32,
    /// Level the current ramp starts from
    start: f32,
    /// Last value returned by `advance`
    level: f32,
    /// Decay finished; holding the sustain level until note-off
    sustaining: bool,
}

impl Envelope {
    /// Create an idle envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the attack from zero.
    pub fn trigger(&mut self) {
        self.trigger_from(0.0);
    }

    /// Start the attack from `level` instead of zero.
    ///
    /// Used when a sounding voice is retriggered so the output does not
    /// jump back to silence.
    pub fn trigger_from(&mut self, level: f32) {
        self.stage = EnvelopeStage::Attack;
        self.elapsed = 0.0;
        self.start = level;
        self.level = level;
        self.sustaining = false;
    }

    /// Enter the release stage from the current level.
    ///
    /// No effect when idle or already releasing.
    pub fn release(&mut self) {
        if matches!(self.stage, EnvelopeStage::Attack | EnvelopeStage::DecaySustain) {
            self.stage = EnvelopeStage::Release;
            self.elapsed = 0.0;
            self.start = self.level;
            self.sustaining = false;
        }
    }

    /// Return to idle at zero immediately.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current stage.
    #[inline]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Last output level.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// `true` while holding the sustain level.
    ///
    /// Once reached, the hold lasts until note-off even if the decay
    /// duration is lengthened afterwards.
    #[inline]
    pub fn is_sustaining(&self) -> bool {
        self.sustaining
    }

    /// `true` once the envelope has finished (or was never triggered).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    /// Return the level at the current elapsed time, then advance by `dt` seconds.
    ///
    /// Stage transitions carry leftover time into the next stage, so a
    /// zero-length segment is passed through within the same sample.
    #[inline]
    pub fn advance(&mut self, shape: &EnvelopeShape, dt: f32) -> f32 {
        let level = loop {
            match self.stage {
                EnvelopeStage::Idle => break 0.0,
                EnvelopeStage::Attack => {
                    let duration = shape.durations[0];
                    if self.elapsed >= duration {
                        self.elapsed -= duration;
                        self.start = shape.values[0];
                        self.stage = EnvelopeStage::DecaySustain;
                        continue;
                    }
                    break lerp(self.start, shape.values[0], self.elapsed / duration);
                }
                EnvelopeStage::DecaySustain => {
                    let duration = shape.durations[1];
                    if self.sustaining || self.elapsed >= duration {
                        self.sustaining = true;
                        break shape.values[1];
                    }
                    break lerp(shape.values[0], shape.values[1], self.elapsed / duration);
                }
                EnvelopeStage::Release => {
                    let duration = shape.durations[2];
                    if self.elapsed >= duration {
                        self.stage = EnvelopeStage::Idle;
                        self.elapsed = 0.0;
                        break shape.values[2];
                    }
                    break lerp(self.start, shape.values[2], self.elapsed / duration);
                }
            }
        };

        if !self.sustaining {
            self.elapsed += dt;
        }
        self.level = level;
        level
    }
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 48000.0;

    fn run(env: &mut Envelope, shape: &EnvelopeShape, samples: usize) -> f32 {
        let mut last = 0.0;
        for _ in 0..samples {
            last = env.advance(shape, DT);
        }
        last
    }

    #[test]
    fn test_idle_outputs_zero() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        assert_eq!(run(&mut env, &shape, 100), 0.0);
        assert!(env.is_idle());
    }

    #[test]
    fn test_first_sample_is_zero() {
        let mut env = Envelope::new();
        env.trigger();
        assert_eq!(env.advance(&EnvelopeShape::default(), DT), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn test_attack_midpoint() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        env.trigger();
        // Sample 2400 is t = 0.05 s, halfway through a 0.1 s attack
        run(&mut env, &shape, 2400);
        let level = env.advance(&shape, DT);
        assert!((level - 0.5).abs() < 1e-3, "expected ~0.5, got {}", level);
    }

    #[test]
    fn test_sustain_holds() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        env.trigger();
        run(&mut env, &shape, 48000);
        assert_eq!(env.stage(), EnvelopeStage::DecaySustain);
        for _ in 0..48000 {
            assert_eq!(env.advance(&shape, DT), 0.7);
        }
    }

    #[test]
    fn test_sustain_survives_shape_edits() {
        let mut env = Envelope::new();
        let mut shape = EnvelopeShape::default();
        env.trigger();
        let before = run(&mut env, &shape, 48000);
        assert!(env.is_sustaining());

        shape.durations[1] = 5.0;
        shape.values[0] = 0.2;
        for _ in 0..1000 {
            let level = env.advance(&shape, DT);
            assert_eq!(level, before, "sustain moved from {} to {}", before, level);
        }
        assert_eq!(env.stage(), EnvelopeStage::DecaySustain);

        env.release();
        assert!(!env.is_sustaining());
        assert_eq!(env.advance(&shape, DT), before);
    }

    #[test]
    fn test_retrigger_leaves_sustain() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        env.trigger();
        run(&mut env, &shape, 48000);
        assert!(env.is_sustaining());
        env.trigger_from(env.level());
        assert!(!env.is_sustaining());
        assert_eq!(env.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn test_release_reaches_target_then_idle() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        env.trigger();
        run(&mut env, &shape, 48000);
        env.release();

        let first = env.advance(&shape, DT);
        assert_eq!(first, 0.7);

        // Half way through the 0.5 s release
        let mid = run(&mut env, &shape, 12000);
        assert!((mid - 0.35).abs() < 1e-3, "expected ~0.35, got {}", mid);

        run(&mut env, &shape, 12100);
        assert!(env.is_idle());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_release_during_attack_is_continuous() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        env.trigger();
        let before = run(&mut env, &shape, 1000);
        env.release();
        let after = env.advance(&shape, DT);
        assert!(
            (after - before).abs() < 1e-6,
            "release jumped from {} to {}",
            before,
            after
        );
        assert!(run(&mut env, &shape, 10) < before);
    }

    #[test]
    fn test_release_when_idle_is_noop() {
        let mut env = Envelope::new();
        env.release();
        assert!(env.is_idle());
    }

    #[test]
    fn test_release_twice_does_not_restart() {
        let mut env = Envelope::new();
        let shape = EnvelopeShape::default();
        env.trigger();
        run(&mut env, &shape, 48000);
        env.release();
        let a = run(&mut env, &shape, 1000);
        env.release();
        let b = env.advance(&shape, DT);
        assert!(b < a, "second release restarted the ramp: {} -> {}", a, b);
    }

    #[test]
    fn test_zero_durations_jump() {
        let shape = EnvelopeShape::new([1.0, 0.4, 0.0], [0.0, 0.0, 0.0]).unwrap();
        let mut env = Envelope::new();
        env.trigger();
        assert_eq!(env.advance(&shape, DT), 0.4);
        assert_eq!(env.stage(), EnvelopeStage::DecaySustain);
        env.release();
        assert_eq!(env.advance(&shape, DT), 0.0);
        assert!(env.is_idle());
    }

    #[test]
    fn test_trigger_from_level() {
        let shape = EnvelopeShape::default();
        let mut env = Envelope::new();
        env.trigger_from(0.6);
        assert_eq!(env.advance(&shape, DT), 0.6);
        let next = env.advance(&shape, DT);
        assert!(next > 0.6 && next < 0.61, "got {}", next);
    }

    #[test]
    fn test_shape_validation() {
        assert!(EnvelopeShape::default().validate().is_ok());
        assert!(EnvelopeShape::new([1.5, 0.7, 0.0], [0.1, 0.2, 0.5]).is_err());
        assert!(EnvelopeShape::new([1.0, 0.7, 0.0], [0.1, -0.2, 0.5]).is_err());
        assert!(EnvelopeShape::new([1.0, f32::NAN, 0.0], [0.1, 0.2, 0.5]).is_err());
        assert!(EnvelopeShape::new([1.0, 0.7, 0.0], [0.1, 0.2, f32::INFINITY]).is_err());
    }
}
