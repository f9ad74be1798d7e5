//! polyfm Synth - Real-time polyphonic FM synthesis engine
//!
//! Turns note events and a handful of timbre parameters into a stereo
//! sample stream, one frame per call, while another thread edits notes and
//! parameters concurrently.
//!
//! # Components
//!
//! - [`Envelope`] / [`EnvelopeShape`] - Three-segment piecewise-linear
//!   attack, decay-to-sustain, release
//! - [`Voice`] - Unison-detuned carriers frequency-modulated by one
//!   modulator, shaped by an envelope
//! - [`VoicePool`] - Fixed polyphony, note-to-voice map, click-free voice
//!   stealing
//! - [`ParamSurface`] - Atomic per-field parameter storage with validated
//!   setters and a per-sample [`SynthParams`] snapshot
//! - [`synth`] - Splits the engine into a control-thread [`SynthHandle`]
//!   and an audio-thread [`Synth`] joined by a lock-free event queue
//!
//! # Example
//!
//! ```rust
//! use polyfm_core::Waveform;
//! use polyfm_synth::{SynthConfig, synth};
//!
//! let (mut handle, mut engine) = synth::<8>(&SynthConfig::default()).unwrap();
//!
//! // Control thread
//! handle.params().set_carrier(Waveform::Square);
//! handle.params().set_modulator_amount(0.02).unwrap();
//! handle.note_on(57, 110).unwrap();
//!
//! // Audio thread
//! let mut buffer = vec![0.0f32; 2 * 256];
//! engine.render(&mut buffer);
//! ```
//!
//! # Features
//!
//! - `std` (default): standard library support for dependencies.
//!   Without it the crate is `no_std` and needs only `alloc` (for the
//!   event queue and the shared parameter `Arc`).
//! - `tracing`: log rejected control input and a full event queue.
//!   The render path never logs.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod engine;
pub mod envelope;
pub mod error;
pub mod event;
pub mod params;
pub mod pool;
pub mod voice;

pub use engine::{Synth, SynthConfig, SynthHandle, synth};
pub use envelope::{Envelope, EnvelopeShape, EnvelopeStage};
pub use error::{Result, SynthError};
pub use event::{NoteAction, NoteEvent};
pub use params::{MAX_MODULATOR_AMOUNT, MAX_UNISON_VARIANCE, ParamSurface, SynthParams};
pub use pool::VoicePool;
pub use voice::{MAX_UNISON, STEAL_FADE_SAMPLES, UnisonUnit, Voice};
