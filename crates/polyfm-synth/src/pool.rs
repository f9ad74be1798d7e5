//! Fixed-capacity voice pool with note-to-voice mapping and voice stealing.
//!
//! # Allocation
//!
//! 1. A note already bound to a voice retriggers that voice, so there is
//!    never more than one voice per note.
//! 2. Otherwise the first idle voice is taken.
//! 3. With every voice busy, the oldest releasing voice is stolen, or the
//!    oldest voice overall if none is releasing. A stolen voice fades out
//!    over [`STEAL_FADE_SAMPLES`] before the new note starts on it.
//!
//! "Oldest" is by allocation sequence number, which increases on every
//! accepted note-on.

use polyfm_core::{MAX_NOTE, Xorshift32};

use crate::error::Result;
use crate::event::{NoteAction, NoteEvent};
use crate::params::SynthParams;
use crate::voice::{STEAL_FADE_SAMPLES, Voice};

const NOTE_COUNT: usize = MAX_NOTE as usize + 1;

/// Polyphonic voice pool.
///
/// # Example
///
/// ```rust
/// use polyfm_synth::{SynthParams, VoicePool};
///
/// let mut pool: VoicePool<8> = VoicePool::new(48000.0, 4);
/// let params = SynthParams::default();
///
/// pool.note_on(60, 100).unwrap();
/// pool.note_on(64, 100).unwrap();
/// pool.note_on(67, 100).unwrap();
/// assert_eq!(pool.active_voice_count(), 3);
///
/// for _ in 0..1000 {
///     let (left, right) = pool.render(&params);
///     assert_eq!(left, right);
/// }
///
/// pool.note_off(64).unwrap();
/// ```
#[derive(Debug)]
pub struct VoicePool<const N: usize> {
    voices: [Voice; N],
    /// Slot bound to each note number
    note_slots: [Option<usize>; NOTE_COUNT],
    /// Global allocation counter
    seq_counter: u64,
    rng: Xorshift32,
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of `N` idle voices with `unison_count` carriers each.
    pub fn new(sample_rate: f32, unison_count: usize) -> Self {
        Self::with_seed(sample_rate, unison_count, 0x5EED_F00D)
    }

    /// Create a pool with an explicit seed for the unison detune draws.
    pub fn with_seed(sample_rate: f32, unison_count: usize, seed: u32) -> Self {
        const { assert!(N > 0, "a voice pool needs at least one voice") };
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate, unison_count)),
            note_slots: [None; NOTE_COUNT],
            seq_counter: 0,
            rng: Xorshift32::new(seed),
        }
    }

    /// Maximum polyphony.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of voices currently producing sound (including fading ones).
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Read access to all voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Slot index bound to `note`, if any.
    pub fn slot_for_note(&self, note: u8) -> Option<usize> {
        self.note_slots.get(usize::from(note)).copied().flatten()
    }

    /// Voice bound to `note`, if any.
    pub fn voice_for_note(&self, note: u8) -> Option<&Voice> {
        self.slot_for_note(note).map(|slot| &self.voices[slot])
    }

    /// Start (or retrigger) a note and return the slot it was given.
    ///
    /// Never fails for lack of voices; only out-of-range input is rejected,
    /// in which case nothing changes.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<usize> {
        NoteEvent::on(note, velocity).validate()?;
        self.seq_counter += 1;
        let seq = self.seq_counter;

        if let Some(slot) = self.slot_for_note(note) {
            self.voices[slot].retrigger(velocity, seq);
            return Ok(slot);
        }

        if let Some(slot) = self.voices.iter().position(|v| !v.is_active()) {
            self.voices[slot].start(note, velocity, seq, &mut self.rng);
            self.note_slots[usize::from(note)] = Some(slot);
            return Ok(slot);
        }

        let slot = self.steal_candidate();
        self.unbind(slot, self.voices[slot].note());
        self.voices[slot].steal(note, velocity, seq);
        self.note_slots[usize::from(note)] = Some(slot);
        Ok(slot)
    }

    /// Release the voice bound to `note`.
    ///
    /// Returns the released slot, or `None` if no voice holds the note (a
    /// no-op that leaves the pool untouched).
    pub fn note_off(&mut self, note: u8) -> Result<Option<usize>> {
        NoteEvent::off(note).validate()?;
        let Some(slot) = self.slot_for_note(note) else {
            return Ok(None);
        };
        let voice = &mut self.voices[slot];
        let was_stolen = voice.is_stolen();
        voice.release();
        if was_stolen {
            // The waiting note never started; the slot is just fading out now
            self.unbind(slot, note);
        }
        Ok(Some(slot))
    }

    /// Apply a note event.
    pub fn handle(&mut self, event: NoteEvent) -> Result<()> {
        match event.action {
            NoteAction::On => self.note_on(event.note, event.velocity).map(|_| ()),
            NoteAction::Off => self.note_off(event.note).map(|_| ()),
        }
    }

    /// Release every bound note.
    pub fn all_notes_off(&mut self) {
        for note in 0..=MAX_NOTE {
            if let Some(slot) = self.slot_for_note(note) {
                let voice = &mut self.voices[slot];
                let was_stolen = voice.is_stolen();
                voice.release();
                if was_stolen {
                    self.unbind(slot, note);
                }
            }
        }
    }

    /// Silence every voice immediately and forget all note bindings.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
        self.note_slots = [None; NOTE_COUNT];
    }

    /// Render one stereo frame as the plain sum of all active voices.
    ///
    /// Voices whose envelope finished are returned to the free pool here.
    #[inline]
    pub fn render(&mut self, params: &SynthParams) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;
        for slot in 0..N {
            let voice = &mut self.voices[slot];
            if !voice.is_active() {
                continue;
            }
            let (l, r) = voice.render(params, &mut self.rng);
            left += l;
            right += r;
            if !voice.is_active() {
                let note = voice.note();
                self.unbind(slot, note);
            }
        }
        (left, right)
    }

    fn unbind(&mut self, slot: usize, note: u8) {
        let entry = &mut self.note_slots[usize::from(note)];
        if *entry == Some(slot) {
            *entry = None;
        }
    }

    fn steal_candidate(&self) -> usize {
        let oldest = |releasing_only: bool| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| !releasing_only || v.is_releasing())
                .min_by_key(|(_, v)| v.seq())
                .map(|(slot, _)| slot)
        };
        oldest(true).or_else(|| oldest(false)).unwrap_or(0)
    }
}
