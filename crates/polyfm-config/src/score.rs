//! Timed note scores for offline rendering and playback.
//!
//! ```toml
//! duration = 4.0   # optional, seconds
//!
//! [[events]]
//! time = 0.0
//! note = 60
//! velocity = 100
//!
//! [[events]]
//! time = 1.5
//! note = 60
//! kind = "off"
//! ```
//!
//! `kind` defaults to `"on"` and `velocity` to 100. Events are sorted by
//! time when loaded; events sharing a time keep their file order.

use std::path::Path;

use polyfm_synth::NoteEvent;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Whether a score event presses or releases its note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Note-on.
    #[default]
    On,
    /// Note-off.
    Off,
}

fn default_velocity() -> u8 {
    100
}

/// One timed note event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreEvent {
    /// Seconds from the start of the score.
    pub time: f64,
    /// MIDI note number.
    pub note: u8,
    /// MIDI velocity (ignored for note-off).
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// Press or release.
    #[serde(default)]
    pub kind: EventKind,
}

impl ScoreEvent {
    /// The engine event this score entry stands for.
    pub fn note_event(&self) -> NoteEvent {
        match self.kind {
            EventKind::On => NoteEvent::on(self.note, self.velocity),
            EventKind::Off => NoteEvent::off(self.note),
        }
    }

    /// Frame index at which the event is due.
    pub fn frame(&self, sample_rate: u32) -> u64 {
        (self.time * f64::from(sample_rate)).round() as u64
    }
}

/// A list of timed note events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Score {
    /// Total length in seconds. When absent, the last event plus a release tail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Events in time order.
    #[serde(default)]
    pub events: Vec<ScoreEvent>,
}

impl Score {
    /// Load a score from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse, validate and sort a score.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut score: Score = toml::from_str(toml_str)?;
        score.validate()?;
        score.events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(score)
    }

    /// Check times, notes, velocities and duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, event) in self.events.iter().enumerate() {
            if !(event.time.is_finite() && event.time >= 0.0) {
                return Err(ConfigError::invalid_score(
                    index,
                    format!("time {} must be a finite number >= 0", event.time),
                ));
            }
            NoteEvent::on(event.note, event.velocity)
                .validate()
                .map_err(|e| ConfigError::invalid_score(index, e.to_string()))?;
        }
        if let Some(duration) = self.duration.filter(|d| !(d.is_finite() && *d >= 0.0)) {
            return Err(ConfigError::invalid_parameter(
                "duration",
                format!("{duration} must be a finite number >= 0"),
            ));
        }
        Ok(())
    }

    /// Time of the last event in seconds (0 for an empty score).
    pub fn end_time(&self) -> f64 {
        self.events.iter().map(|e| e.time).fold(0.0, f64::max)
    }

    /// Total length to render: `duration` if set, else the last event plus `tail`.
    pub fn length(&self, tail: f64) -> f64 {
        self.duration.unwrap_or_else(|| self.end_time() + tail)
    }
}
