//! Error types for polyfm-synth.
//!
//! Every variant is `Copy` and carries no heap data, so errors can be
//! built on either thread without allocating. The render path itself
//! never produces one.

/// Result type alias for polyfm-synth operations.
pub type Result<T> = core::result::Result<T, SynthError>;

/// Errors returned by the control-path API.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SynthError {
    /// MIDI note number above 127.
    #[error("note {0} out of range (0-127)")]
    NoteOutOfRange(u8),

    /// MIDI velocity above 127.
    #[error("velocity {0} out of range (0-127)")]
    VelocityOutOfRange(u8),

    /// Waveform selector index that names no waveform.
    #[error("unknown waveform index {0} (expected 0-3)")]
    UnknownWaveform(u8),

    /// Parameter value outside its documented domain (or not finite).
    #[error("parameter '{param}' value {value} outside its domain")]
    ParamOutOfRange {
        /// Name of the rejected parameter.
        param: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Envelope breakpoint index other than 0, 1 or 2.
    #[error("envelope segment {0} does not exist (expected 0-2)")]
    EnvelopeSegmentOutOfRange(usize),

    /// The note event queue has no free slot; the event was not sent.
    #[error("note event queue is full")]
    QueueFull,
}

impl SynthError {
    /// `true` for rejected input, `false` for back-pressure ([`SynthError::QueueFull`]).
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, SynthError::QueueFull)
    }
}
