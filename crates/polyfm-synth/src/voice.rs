//! A single sounding note: unison carriers, one FM modulator, one envelope.
//!
//! # Signal Flow
//!
//! ```text
//! modulator (f * ratio) --> m
//!                           |
//! unison carrier i:  f_i = f * (1 + u_i * variance)
//!                    phase_i += f_i * (1 + m * amount) / fs
//!                           |
//!           sum / count * envelope * velocity/127 * volume * steal fade
//! ```
//!
//! `u_i` is drawn once per note from `[-1, 1]`, so the effective detune of
//! each unit is a fixed draw from `[-variance, +variance]` at any constant
//! variance setting. All carriers start in phase.

use polyfm_core::{LinearRamp, Xorshift32, evaluate, flush_denormal, midi_to_freq, wrap_phase};

use crate::envelope::{Envelope, EnvelopeStage};
use crate::params::SynthParams;

/// Maximum unison carriers per voice.
pub const MAX_UNISON: usize = 16;

/// Length of the fade-out applied to a stolen voice before it is reused.
pub const STEAL_FADE_SAMPLES: u32 = 64;

/// One unison carrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnisonUnit {
    /// Phase in `[0, 1)`
    phase: f32,
    /// Unit detune draw in `[-1, 1]`, scaled by the unison variance
    detune: f32,
}

impl UnisonUnit {
    /// Current phase.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Unit detune draw in `[-1, 1]`.
    pub fn detune(&self) -> f32 {
        self.detune
    }
}

/// Note waiting to start once a stolen voice has faded out.
#[derive(Debug, Clone, Copy)]
struct PendingNote {
    note: u8,
    velocity: u8,
    seq: u64,
}

/// A polyphonic voice.
///
/// Voices are owned by a [`VoicePool`](crate::VoicePool), which decides
/// which note each one plays. They never allocate.
#[derive(Debug, Clone)]
pub struct Voice {
    unison: [UnisonUnit; MAX_UNISON],
    unison_count: usize,
    modulator_phase: f32,
    envelope: Envelope,
    /// Gain ramp used only while being stolen
    steal_fade: LinearRamp,
    pending: Option<PendingNote>,
    note: u8,
    velocity: u8,
    /// Allocation sequence number (higher is newer)
    seq: u64,
    /// Note frequency in Hz, cached at note start
    frequency: f32,
    active: bool,
    /// One sample period in seconds
    sample_period: f32,
}

impl Voice {
    /// Create an idle voice. `unison_count` is clamped to `1..=MAX_UNISON`.
    pub fn new(sample_rate: f32, unison_count: usize) -> Self {
        Self {
            unison: [UnisonUnit::default(); MAX_UNISON],
            unison_count: unison_count.clamp(1, MAX_UNISON),
            modulator_phase: 0.0,
            envelope: Envelope::new(),
            steal_fade: LinearRamp::new(1.0),
            pending: None,
            note: 0,
            velocity: 0,
            seq: 0,
            frequency: 0.0,
            active: false,
            sample_period: 1.0 / sample_rate,
        }
    }

    /// Start a note on an idle voice.
    pub(crate) fn start(&mut self, note: u8, velocity: u8, seq: u64, rng: &mut Xorshift32) {
        self.note = note;
        self.velocity = velocity;
        self.seq = seq;
        self.frequency = midi_to_freq(note);
        self.modulator_phase = 0.0;
        for unit in &mut self.unison[..self.unison_count] {
            unit.phase = 0.0;
            unit.detune = rng.next_bipolar();
        }
        self.envelope.trigger();
        self.steal_fade.set_immediate(1.0);
        self.pending = None;
        self.active = true;
    }

    /// Restart the attack for a repeated note-on of the note this voice holds.
    ///
    /// The attack begins at the level that keeps `envelope * velocity`
    /// continuous, so a louder repeat does not click. The start is capped at
    /// full scale, so a much softer repeat steps down to the new velocity.
    pub(crate) fn retrigger(&mut self, velocity: u8, seq: u64) {
        if let Some(pending) = &mut self.pending {
            pending.velocity = velocity;
            pending.seq = seq;
            return;
        }
        let start = if velocity == 0 {
            0.0
        } else {
            (self.envelope.level() * f32::from(self.velocity) / f32::from(velocity)).min(1.0)
        };
        self.velocity = velocity;
        self.seq = seq;
        self.envelope.trigger_from(start);
    }

    /// Fade this voice out, then start `note` on it.
    ///
    /// Stealing a voice that is already fading just replaces the waiting note.
    pub(crate) fn steal(&mut self, note: u8, velocity: u8, seq: u64) {
        if !self.is_fading() {
            self.steal_fade.ramp_to(0.0, STEAL_FADE_SAMPLES);
        }
        self.pending = Some(PendingNote {
            note,
            velocity,
            seq,
        });
    }

    /// Release the note this voice is bound to.
    ///
    /// For a stolen voice that is the waiting note, which is dropped; the
    /// fade-out then finishes and the voice goes idle.
    pub(crate) fn release(&mut self) {
        if self.pending.take().is_none() && !self.is_fading() {
            self.envelope.release();
        }
    }

    /// Silence immediately and return to idle.
    pub(crate) fn kill(&mut self) {
        self.envelope.reset();
        self.steal_fade.set_immediate(1.0);
        self.pending = None;
        self.active = false;
    }

    /// Render one stereo frame. Idle voices return silence.
    ///
    /// `rng` supplies detune draws when a stolen voice starts its new note.
    #[inline]
    pub fn render(&mut self, params: &SynthParams, rng: &mut Xorshift32) -> (f32, f32) {
        if !self.active {
            return (0.0, 0.0);
        }

        let env = self.envelope.advance(&params.envelope, self.sample_period);
        let fade = self.steal_fade.advance();

        self.modulator_phase = wrap_phase(
            self.modulator_phase + self.frequency * params.modulator_ratio * self.sample_period,
        );
        let fm = 1.0 + evaluate(params.modulator, self.modulator_phase) * params.modulator_amount;

        let mut sum = 0.0;
        for unit in &mut self.unison[..self.unison_count] {
            let freq = self.frequency * (1.0 + unit.detune * params.unison_variance);
            unit.phase = wrap_phase(unit.phase + freq * fm * self.sample_period);
            sum += evaluate(params.carrier, unit.phase);
        }

        let gain = env * f32::from(self.velocity) / 127.0 * params.volume * fade;
        let out = flush_denormal(sum / self.unison_count as f32 * gain);

        if self.is_fading() {
            if self.steal_fade.is_settled() {
                match self.pending.take() {
                    Some(next) => self.start(next.note, next.velocity, next.seq, rng),
                    None => self.kill(),
                }
            }
        } else if self.envelope.is_idle() {
            self.active = false;
        }

        (out, out)
    }

    fn is_fading(&self) -> bool {
        self.steal_fade.target() < 1.0
    }

    /// `true` while the voice is producing (or about to produce) sound.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `true` if the voice is winding down with nothing to play next:
    /// releasing normally, or fading out after its waiting note was dropped.
    pub fn is_releasing(&self) -> bool {
        self.active
            && self.pending.is_none()
            && (self.is_fading() || self.envelope.stage() == EnvelopeStage::Release)
    }

    /// `true` while fading out to make room for a waiting note.
    pub fn is_stolen(&self) -> bool {
        self.pending.is_some()
    }

    /// Note this voice answers to: the waiting note while stolen, otherwise
    /// the sounding one.
    pub fn note(&self) -> u8 {
        self.pending.map_or(self.note, |p| p.note)
    }

    /// Note currently audible from this voice.
    pub fn sounding_note(&self) -> u8 {
        self.note
    }

    /// Velocity of the note this voice answers to.
    pub fn velocity(&self) -> u8 {
        self.pending.map_or(self.velocity, |p| p.velocity)
    }

    /// Allocation sequence number of the note this voice answers to.
    pub fn seq(&self) -> u64 {
        self.pending.map_or(self.seq, |p| p.seq)
    }

    /// Envelope stage of the sounding note.
    pub fn stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    /// Last envelope output.
    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    /// Number of unison carriers.
    pub fn unison_count(&self) -> usize {
        self.unison_count
    }

    /// The active unison carriers.
    pub fn unison(&self) -> &[UnisonUnit] {
        &self.unison[..self.unison_count]
    }
}
