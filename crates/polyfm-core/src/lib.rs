//! polyfm Core - DSP primitives for the polyfm synthesizer
//!
//! Leaf crate of the workspace. Everything here is stateless or owns only
//! a few scalars, never allocates, and is usable from the real-time render
//! path.
//!
//! # Contents
//!
//! - [`Waveform`] / [`evaluate`] - The single waveform evaluation primitive
//!   (sine, triangle, square, saw) shared by carriers and modulators
//! - [`midi_to_freq`] - Twelve-tone equal temperament, A4 = 440 Hz
//! - [`LinearRamp`] - Constant-rate smoothing for click-free fades
//! - [`Xorshift32`] - Allocation-free PRNG for unison detune draws
//! - [`soft_clip`] / [`flush_denormal`] - Output-stage helpers
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! polyfm-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod math;
pub mod ramp;
pub mod rng;
pub mod waveform;

pub use math::{A4_FREQ, A4_NOTE, MAX_NOTE, flush_denormal, midi_to_freq, soft_clip};
pub use ramp::LinearRamp;
pub use rng::Xorshift32;
pub use waveform::{ParseWaveformError, Waveform, evaluate, wrap_phase};
