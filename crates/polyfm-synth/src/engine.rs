//! Control handle and real-time render engine.
//!
//! [`synth`] builds a connected pair:
//!
//! - [`SynthHandle`] lives on the control thread. It validates note events
//!   and pushes them into a bounded lock-free SPSC queue, and exposes the
//!   shared [`ParamSurface`].
//! - [`Synth`] lives on the audio thread. Before every frame it drains the
//!   queue into its [`VoicePool`], takes one parameter snapshot, and renders.
//!
//! Both halves are `Send`. Nothing on the [`Synth`] side blocks, allocates,
//! or takes a lock.

use alloc::sync::Arc;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::error::{Result, SynthError};
use crate::event::NoteEvent;
use crate::params::{ParamSurface, SynthParams};
use crate::pool::VoicePool;
use crate::voice::MAX_UNISON;

/// Construction settings for a [`synth`] pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthConfig {
    /// Output sample rate in Hz.
    pub sample_rate: f32,
    /// Unison carriers per voice, `1..=MAX_UNISON`.
    pub unison_voices: usize,
    /// Capacity of the note event queue.
    pub queue_capacity: usize,
    /// Seed for unison detune draws.
    pub seed: u32,
    /// Initial parameter values.
    pub params: SynthParams,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            unison_voices: 4,
            queue_capacity: 1024,
            seed: 0x5EED_F00D,
            params: SynthParams::default(),
        }
    }
}

impl SynthConfig {
    /// Check sample rate, unison count, queue capacity and initial parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(SynthError::ParamOutOfRange {
                param: "sample_rate",
                value: self.sample_rate,
            });
        }
        if !(1..=MAX_UNISON).contains(&self.unison_voices) {
            return Err(SynthError::ParamOutOfRange {
                param: "unison_voices",
                value: self.unison_voices as f32,
            });
        }
        if self.queue_capacity == 0 {
            return Err(SynthError::ParamOutOfRange {
                param: "queue_capacity",
                value: 0.0,
            });
        }
        self.params.validate()
    }
}

/// Queue item. All-notes-off travels in order with the note events it follows.
#[derive(Clone, Copy, Debug)]
enum Command {
    Note(NoteEvent),
    AllNotesOff,
}

/// Create a control handle and render engine with `N` voices of polyphony.
///
/// # Example
///
/// ```rust
/// use polyfm_synth::{SynthConfig, synth};
///
/// let (mut handle, mut engine) = synth::<16>(&SynthConfig::default()).unwrap();
///
/// handle.note_on(60, 100).unwrap();
/// handle.params().set_volume(0.8).unwrap();
///
/// let mut block = [0.0f32; 512];
/// engine.render(&mut block);
/// assert_eq!(engine.pool().active_voice_count(), 1);
/// ```
pub fn synth<const N: usize>(config: &SynthConfig) -> Result<(SynthHandle, Synth<N>)> {
    config.validate()?;
    let params = Arc::new(ParamSurface::with_params(&config.params)?);
    let (producer, consumer) = HeapRb::<Command>::new(config.queue_capacity).split();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        polyphony = N,
        sample_rate = config.sample_rate,
        unison = config.unison_voices,
        queue = config.queue_capacity,
        "synth created"
    );

    let handle = SynthHandle {
        events: producer,
        params: Arc::clone(&params),
    };
    let engine = Synth {
        events: consumer,
        params,
        pool: VoicePool::with_seed(config.sample_rate, config.unison_voices, config.seed),
        sample_rate: config.sample_rate,
    };
    Ok((handle, engine))
}

/// Control-thread side of a [`synth`] pair.
pub struct SynthHandle {
    events: HeapProd<Command>,
    params: Arc<ParamSurface>,
}

impl core::fmt::Debug for SynthHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SynthHandle")
            .field("queued", &self.events.occupied_len())
            .field("capacity", &self.events.capacity())
            .finish_non_exhaustive()
    }
}

impl SynthHandle {
    /// Queue a note-on.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<()> {
        self.send(NoteEvent::on(note, velocity))
    }

    /// Queue a note-off.
    pub fn note_off(&mut self, note: u8) -> Result<()> {
        self.send(NoteEvent::off(note))
    }

    /// Validate and queue a note event.
    ///
    /// Invalid events are rejected here and never reach the audio thread.
    /// A full queue returns [`SynthError::QueueFull`] and the caller keeps
    /// the event.
    pub fn send(&mut self, event: NoteEvent) -> Result<()> {
        if let Err(err) = event.validate() {
            #[cfg(feature = "tracing")]
            tracing::warn!(?event, %err, "note event rejected");
            return Err(err);
        }
        self.push(Command::Note(event))
    }

    /// Decode and queue a raw MIDI message.
    ///
    /// Returns `Ok(false)` for messages that are not note-on/note-off.
    pub fn send_midi(&mut self, bytes: &[u8]) -> Result<bool> {
        match NoteEvent::from_midi(bytes) {
            Some(event) => self.send(event).map(|()| true),
            None => Ok(false),
        }
    }

    /// Queue a release of every sounding note.
    pub fn all_notes_off(&mut self) -> Result<()> {
        self.push(Command::AllNotesOff)
    }

    fn push(&mut self, command: Command) -> Result<()> {
        self.events.try_push(command).map_err(|_| {
            #[cfg(feature = "tracing")]
            tracing::warn!(?command, "note queue full");
            SynthError::QueueFull
        })
    }

    /// The shared parameter surface.
    pub fn params(&self) -> &ParamSurface {
        &self.params
    }

    /// A new reference to the parameter surface, for another control thread.
    pub fn shared_params(&self) -> Arc<ParamSurface> {
        Arc::clone(&self.params)
    }

    /// Free slots left in the note queue.
    pub fn free_capacity(&self) -> usize {
        self.events.vacant_len()
    }
}

/// Audio-thread side of a [`synth`] pair.
pub struct Synth<const N: usize> {
    events: HeapCons<Command>,
    params: Arc<ParamSurface>,
    pool: VoicePool<N>,
    sample_rate: f32,
}

impl<const N: usize> core::fmt::Debug for Synth<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Synth")
            .field("sample_rate", &self.sample_rate)
            .field("polyphony", &N)
            .field("active_voices", &self.pool.active_voice_count())
            .field("pending_events", &self.events.occupied_len())
            .finish_non_exhaustive()
    }
}

impl<const N: usize> Synth<N> {
    /// Apply every queued event, then render one stereo frame.
    #[inline]
    pub fn render_frame(&mut self) -> (f32, f32) {
        self.drain_events();
        let params = self.params.snapshot();
        self.pool.render(&params)
    }

    /// Fill an interleaved stereo buffer, one frame at a time.
    ///
    /// A trailing odd sample is set to zero.
    pub fn render(&mut self, out: &mut [f32]) {
        self.render_interleaved(out, 2);
    }

    /// Fill an interleaved buffer with `channels` channels.
    ///
    /// Mono gets the left channel; channels beyond the second are zeroed.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let mut frames = out.chunks_exact_mut(channels);
        for frame in &mut frames {
            let (left, right) = self.render_frame();
            frame[0] = left;
            if let Some(slot) = frame.get_mut(1) {
                *slot = right;
            }
            for slot in frame.iter_mut().skip(2) {
                *slot = 0.0;
            }
        }
        frames.into_remainder().fill(0.0);
    }

    fn drain_events(&mut self) {
        while let Some(command) = self.events.try_pop() {
            match command {
                Command::Note(event) => {
                    let handled = self.pool.handle(event);
                    debug_assert!(
                        handled.is_ok(),
                        "unvalidated event {event:?} reached the engine"
                    );
                }
                Command::AllNotesOff => self.pool.all_notes_off(),
            }
        }
    }

    /// Silence every voice immediately and discard queued events.
    pub fn reset(&mut self) {
        self.events.clear();
        self.pool.reset();
    }

    /// Events queued but not yet applied.
    pub fn pending_events(&self) -> usize {
        self.events.occupied_len()
    }

    /// The voice pool, for inspection.
    pub fn pool(&self) -> &VoicePool<N> {
        &self.pool
    }

    /// The shared parameter surface.
    pub fn params(&self) -> &ParamSurface {
        &self.params
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
