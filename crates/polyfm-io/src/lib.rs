//! Audio I/O layer for polyfm.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`write_wav_stereo`] for rendered output, [`read_wav_stereo`]
//!   and [`read_wav_info`] for inspecting it
//! - **Real-time output**: [`OutputStream`] drives a render callback from a cpal
//!   output device
//! - **Soft clipping**: [`soft_clip_buffer`] for consumers that opt into limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polyfm_io::{WavSpec, write_wav_stereo};
//!
//! let frames = vec![0.0f32; 2 * 48000];
//! write_wav_stereo("silence.wav", &frames, WavSpec::default())?;
//! ```

mod stream;
mod wav;

pub use stream::{AudioDevice, OutputConfig, OutputStream, list_output_devices};
pub use wav::{WavInfo, WavSpec, read_wav_info, read_wav_stereo, write_wav_stereo};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Apply [`polyfm_core::soft_clip`] to every sample in place.
pub fn soft_clip_buffer(samples: &mut [f32]) {
    for sample in samples {
        *sample = polyfm_core::soft_clip(*sample);
    }
}
