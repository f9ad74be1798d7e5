//! Configuration and scores for the polyfm synthesizer.
//!
//! Everything here runs on the control path. The engine itself never reads
//! files; this crate turns TOML into validated engine settings.
//!
//! # Features
//!
//! - **Engine config**: Sample rate, unison, queue size, soft clip and
//!   initial parameters ([`EngineConfig`])
//! - **Ratio slider**: The integer slider to modulator ratio mapping
//!   ([`modulator_ratio_from_step`])
//! - **Scores**: Timed note events for offline rendering and playback
//!   ([`Score`])
//!
//! # Example
//!
//! ```rust
//! use polyfm_config::{EngineConfig, Score};
//! use polyfm_synth::synth;
//!
//! let config = EngineConfig::from_toml("[params]\ncarrier = \"square\"\n").unwrap();
//! let (mut handle, mut engine) = synth::<8>(&config.synth_config().unwrap()).unwrap();
//!
//! let score = Score::from_toml("[[events]]\ntime = 0.0\nnote = 60\n").unwrap();
//! for event in &score.events {
//!     handle.send(event.note_event()).unwrap();
//! }
//! let (left, _right) = engine.render_frame();
//! assert_eq!(left, 0.0); // attack starts from silence
//! ```

mod engine_config;
mod error;
mod score;

pub use engine_config::{
    EngineConfig, MAX_RATIO_STEP, ParamsConfig, UNITY_RATIO_STEP, modulator_ratio_from_step,
};
pub use error::ConfigError;
pub use score::{EventKind, Score, ScoreEvent};
