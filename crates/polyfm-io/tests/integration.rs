//! Integration tests for polyfm-io WAV output.

use polyfm_io::{WavSpec, read_wav_info, read_wav_stereo, soft_clip_buffer, write_wav_stereo};
use tempfile::NamedTempFile;

/// Interleaved stereo sine with the right channel inverted.
fn stereo_sine(sample_rate: u32, freq_hz: f32, frames: usize, gain: f32) -> Vec<f32> {
    (0..frames)
        .flat_map(|i| {
            let s = gain
                * (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin();
            [s, -s]
        })
        .collect()
}

#[test]
fn wav_roundtrip_stereo_f32_44100() {
    let sr = 44100;
    let frames = stereo_sine(sr, 440.0, sr as usize, 0.8);
    let spec = WavSpec {
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav_stereo(file.path(), &frames, spec).unwrap();

    let (loaded, info) = read_wav_stereo(file.path()).unwrap();
    assert_eq!(info.sample_rate, sr);
    assert_eq!(info.channels, 2);
    assert_eq!(loaded.len(), frames.len());
    for (a, b) in frames.iter().zip(loaded.iter()) {
        assert!(
            (a - b).abs() < 1e-6,
            "sample mismatch: {a} vs {b} (diff={})",
            (a - b).abs()
        );
    }
}

#[test]
fn wav_roundtrip_stereo_i24() {
    let frames = stereo_sine(48000, 1000.0, 4800, 0.5);
    let spec = WavSpec {
        sample_rate: 48000,
        bits_per_sample: 24,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav_stereo(file.path(), &frames, spec).unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.bits_per_sample, 24);
    assert!(!info.is_float);
    assert_eq!(info.num_frames, 4800);

    let (loaded, _) = read_wav_stereo(file.path()).unwrap();
    for (a, b) in frames.iter().zip(loaded.iter()) {
        assert!((a - b).abs() < 1e-5, "{a} vs {b}");
    }
}

#[test]
fn soft_clipped_output_stays_in_range() {
    let mut frames = stereo_sine(48000, 220.0, 4800, 4.0);
    soft_clip_buffer(&mut frames);

    let file = NamedTempFile::new().unwrap();
    write_wav_stereo(file.path(), &frames, WavSpec::default()).unwrap();

    let (loaded, _) = read_wav_stereo(file.path()).unwrap();
    let peak = loaded.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak <= 1.0, "peak {peak}");
    assert!(peak > 0.99, "peak {peak} should approach full scale");
}

#[test]
fn missing_file_is_wav_error() {
    let err = read_wav_info("/nonexistent/polyfm/missing.wav").unwrap_err();
    assert!(matches!(err, polyfm_io::Error::Wav(_)), "got {err:?}");
}
