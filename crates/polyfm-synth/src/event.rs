//! Note events and MIDI note message decoding.

use polyfm_core::MAX_NOTE;

use crate::error::{Result, SynthError};

/// Status nibble of a MIDI note-off message.
pub const NOTE_OFF_STATUS: u8 = 0x80;

/// Status nibble of a MIDI note-on message.
pub const NOTE_ON_STATUS: u8 = 0x90;

/// What a [`NoteEvent`] does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteAction {
    /// Key pressed.
    On,
    /// Key released.
    Off,
}

/// A note-on or note-off for one MIDI note number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoteEvent {
    /// Press or release.
    pub action: NoteAction,
    /// MIDI note number, 0-127.
    pub note: u8,
    /// MIDI velocity, 0-127. Ignored for [`NoteAction::Off`].
    pub velocity: u8,
}

impl NoteEvent {
    /// A note-on event.
    pub const fn on(note: u8, velocity: u8) -> Self {
        Self {
            action: NoteAction::On,
            note,
            velocity,
        }
    }

    /// A note-off event.
    pub const fn off(note: u8) -> Self {
        Self {
            action: NoteAction::Off,
            note,
            velocity: 0,
        }
    }

    /// Reject note numbers or velocities above 127.
    pub fn validate(&self) -> Result<()> {
        if self.note > MAX_NOTE {
            return Err(SynthError::NoteOutOfRange(self.note));
        }
        if self.velocity > 127 {
            return Err(SynthError::VelocityOutOfRange(self.velocity));
        }
        Ok(())
    }

    /// Decode a three-byte MIDI note message on any channel.
    ///
    /// A note-on with velocity 0 decodes as a note-off. Any other message,
    /// wrong length, or data byte with the high bit set gives `None`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use polyfm_synth::{NoteAction, NoteEvent};
    ///
    /// let on = NoteEvent::from_midi(&[0x93, 60, 100]).unwrap();
    /// assert_eq!(on, NoteEvent::on(60, 100));
    ///
    /// let off = NoteEvent::from_midi(&[0x90, 60, 0]).unwrap();
    /// assert_eq!(off.action, NoteAction::Off);
    ///
    /// assert!(NoteEvent::from_midi(&[0xB0, 7, 100]).is_none());
    /// ```
    pub fn from_midi(bytes: &[u8]) -> Option<Self> {
        let &[status, note, velocity] = bytes else {
            return None;
        };
        if note > MAX_NOTE || velocity > 127 {
            return None;
        }
        match status & 0xF0 {
            NOTE_ON_STATUS if velocity > 0 => Some(Self::on(note, velocity)),
            NOTE_ON_STATUS | NOTE_OFF_STATUS => Some(Self::off(note)),
            _ => None,
        }
    }
}
