//! WAV file reading and writing for interleaved stereo frames.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// Output WAV specification.
///
/// Files are always stereo. 32 bits per sample writes IEEE float, any other
/// depth writes integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: 2,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Whether samples are IEEE float.
    pub is_float: bool,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        is_float: spec.sample_format == SampleFormat::Float,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
    })
}

/// Write interleaved stereo frames (`[l0, r0, l1, r1, ...]`) to a WAV file.
///
/// Integer depths clamp to full scale. A buffer with an odd sample count is
/// rejected by the writer when the file is finalized.
///
/// # Example
/// ```ignore
/// let frames = vec![0.0f32; 2 * 48000];
/// write_wav_stereo("output.wav", &frames, WavSpec::default())?;
/// ```
pub fn write_wav_stereo<P: AsRef<Path>>(path: P, frames: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in frames {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in frames {
            writer.write_sample((sample * max_val).clamp(-max_val, max_val - 1.0) as i32)?;
        }
    }

    writer.finalize()?;
    tracing::debug!(
        frames = frames.len() / 2,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "wrote WAV"
    );
    Ok(())
}

/// Read a WAV file as interleaved stereo frames.
///
/// Mono files are duplicated to both channels; files with more than two
/// channels keep their first two.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavInfo)> {
    let info = read_wav_info(path.as_ref())?;
    let reader = WavReader::open(path)?;
    let channels = usize::from(info.channels.max(1));

    let samples: Vec<f32> = if info.is_float {
        reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        let max_val = (1i32 << (info.bits_per_sample - 1)) as f32;
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / max_val))
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    let mut frames = Vec::with_capacity(samples.len() / channels * 2);
    for chunk in samples.chunks_exact(channels) {
        frames.push(chunk[0]);
        frames.push(chunk.get(1).copied().unwrap_or(chunk[0]));
    }
    Ok((frames, info))
}
