//! Integration tests for polyfm-cli.
//!
//! Tests run the `polyfm` binary and check its output files.

use polyfm_config::EngineConfig;
use polyfm_io::read_wav_stereo;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

/// Helper to get the path to the `polyfm` binary built by cargo.
fn polyfm_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_polyfm"))
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const CHORD: &str = r#"
[[events]]
time = 0.0
note = 60

[[events]]
time = 0.0
note = 64

[[events]]
time = 0.0
note = 67

[[events]]
time = 0.25
note = 60
kind = "off"

[[events]]
time = 0.25
note = 64
kind = "off"

[[events]]
time = 0.25
note = 67
kind = "off"
"#;

// ---------------------------------------------------------------------------
// `polyfm config`
// ---------------------------------------------------------------------------

#[test]
fn cli_config_prints_defaults() {
    let output = polyfm_bin()
        .arg("config")
        .output()
        .expect("failed to run polyfm config");
    assert!(output.status.success(), "polyfm config failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let config = EngineConfig::from_toml(&stdout).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert!(stdout.contains("modulator_ratio_step = 4"), "got:\n{stdout}");
}

#[test]
fn cli_config_applies_file_and_overrides() {
    let file = write_temp("sample_rate = 44100\n[params]\ncarrier = \"square\"\n");
    let output = polyfm_bin()
        .args(["config", "--config"])
        .arg(file.path())
        .args(["--param", "volume=0.3"])
        .output()
        .expect("failed to run polyfm config");
    assert!(output.status.success(), "polyfm config failed");

    let config = EngineConfig::from_toml(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(config.sample_rate, 44100);
    assert_eq!(config.params.carrier, "square");
    assert_eq!(config.params.volume, 0.3);
}

#[test]
fn cli_config_rejects_invalid_values() {
    let output = polyfm_bin()
        .args(["config", "--param", "modulator_amount=0.5"])
        .output()
        .expect("failed to run polyfm config");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("modulator_amount"), "got:\n{stderr}");
}

// ---------------------------------------------------------------------------
// `polyfm render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_writes_stereo_wav() {
    let score = write_temp(CHORD);
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("chord.wav");

    let output = polyfm_bin()
        .arg("render")
        .arg(score.path())
        .arg("--output")
        .arg(&out)
        .args(["--param", "modulator_amount=0.02", "--soft-clip"])
        .output()
        .expect("failed to run polyfm render");
    assert!(
        output.status.success(),
        "polyfm render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (frames, info) = read_wav_stereo(&out).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 48000);
    assert!(info.is_float);
    // 0.25s of notes, 0.5s release, 0.05s padding
    assert_eq!(info.num_frames, 38400);

    let peak = frames.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.05 && peak <= 1.0, "peak {peak}");
    assert_eq!(frames[frames.len() - 2], 0.0);
}

#[test]
fn cli_render_explicit_duration_and_bits() {
    let score = write_temp(CHORD);
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("short.wav");

    let output = polyfm_bin()
        .arg("render")
        .arg(score.path())
        .arg("-o")
        .arg(&out)
        .args(["--duration", "0.1", "--bits", "16", "--sample-rate", "44100"])
        .output()
        .expect("failed to run polyfm render");
    assert!(output.status.success());

    let (_, info) = read_wav_stereo(&out).unwrap();
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.num_frames, 4410);
}

#[test]
fn cli_render_reports_bad_score() {
    let score = write_temp("[[events]]\ntime = 0.0\nnote = 130\n");
    let dir = TempDir::new().unwrap();

    let output = polyfm_bin()
        .arg("render")
        .arg(score.path())
        .arg("-o")
        .arg(dir.path().join("never.wav"))
        .output()
        .expect("failed to run polyfm render");
    assert!(!output.status.success());
    assert!(!dir.path().join("never.wav").exists());
}
