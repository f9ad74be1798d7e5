//! Error types for configuration operations.

use std::path::PathBuf;

use polyfm_synth::SynthError;
use thiserror::Error;

/// Errors that can occur while loading or interpreting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A configuration field that cannot be interpreted
    #[error("invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Name of the field.
        param: String,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// A score event that cannot be played
    #[error("invalid score event #{index}: {reason}")]
    InvalidScore {
        /// Position of the event in the file.
        index: usize,
        /// Description of why the event is invalid.
        reason: String,
    },

    /// The engine rejected a value
    #[error(transparent)]
    Synth(#[from] SynthError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid score error.
    pub fn invalid_score(index: usize, reason: impl Into<String>) -> Self {
        ConfigError::InvalidScore {
            index,
            reason: reason.into(),
        }
    }
}
