use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_snore_cli"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("snore_cli_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Stereo 16-bit recording with a tone on both channels.
fn write_raw_recording(path: &Path, sample_rate: u32, seconds: f64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (seconds * sample_rate as f64) as usize;
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let value = (0.3 * (2.0 * std::f64::consts::PI * 300.0 * t).sin() * i16::MAX as f64) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

fn run_json(args: &[&str]) -> Value {
    let output = cli().args(args).output().expect("failed to run snore_cli");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("JSON payload")
}

#[test]
fn slice_then_check_then_dataset() {
    let root = scratch_dir("flow");
    let config = root.join("missing.json");
    let raw = root.join("raw");
    let clips = root.join("clips");
    write_raw_recording(&raw.join("snore").join("night.wav"), 48_000, 3.5);
    write_raw_recording(&raw.join("non_snore").join("fan.wav"), 16_000, 2.0);

    let sliced = run_json(&[
        "--config",
        config.to_str().unwrap(),
        "slice",
        "--raw-dir",
        raw.to_str().unwrap(),
        "--clips-dir",
        clips.to_str().unwrap(),
    ]);
    let reports = sliced.as_array().expect("array of reports");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["label"], "non_snore");
    assert_eq!(reports[0]["total_clips"], 2);
    assert_eq!(reports[1]["label"], "snore");
    assert_eq!(reports[1]["total_clips"], 3);
    assert!(clips.join("snore").join("night_0002.wav").is_file());
    assert!(!clips.join("snore").join("night_0003.wav").exists());

    let checked = run_json(&[
        "--config",
        config.to_str().unwrap(),
        "check",
        "--label",
        "snore",
        "--clips-dir",
        clips.to_str().unwrap(),
    ]);
    assert_eq!(checked[0]["clip_count"], 3);
    assert_eq!(checked[0]["sample_rate"], 16_000);
    assert_eq!(checked[0]["warnings"].as_array().map(Vec::len), Some(0));

    let summary = run_json(&[
        "--config",
        config.to_str().unwrap(),
        "dataset",
        "--clips-dir",
        clips.to_str().unwrap(),
        "--extract",
        "--workers",
        "2",
    ]);
    assert_eq!(summary["total_clips"], 5);
    assert_eq!(summary["labels"][1]["clips"], 3);
    assert_eq!(summary["extraction"]["extracted"], 5);
    assert_eq!(summary["extraction"]["failed"], 0);
    assert_eq!(summary["extraction"]["shape"], serde_json::json!([1, 64, 59]));

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn features_from_synthetic_signal() {
    let root = scratch_dir("synthetic");
    let output_path = root.join("tensor.json");
    let report = run_json(&[
        "--config",
        root.join("missing.json").to_str().unwrap(),
        "features",
        "--synthetic",
        "white-noise",
        "--seconds",
        "1.0",
        "--output",
        output_path.to_str().unwrap(),
    ]);
    assert_eq!(report["shape"], serde_json::json!([1, 64, 59]));
    assert_eq!(report["samples"], 16_000);

    let tensor: Value =
        serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).expect("tensor JSON");
    assert_eq!(tensor["n_mels"], 64);
    assert_eq!(tensor["n_frames"], 59);
    assert_eq!(tensor["data"].as_array().map(Vec::len), Some(64 * 59));

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn features_respect_config_file() {
    let root = scratch_dir("config");
    let config = root.join("pipeline.json");
    fs::write(
        &config,
        r#"{ "features": { "n_fft": 512, "hop_length": 128, "n_mels": 40 } }"#,
    )
    .unwrap();

    let report = run_json(&[
        "--config",
        config.to_str().unwrap(),
        "features",
        "--synthetic",
        "silence",
    ]);
    assert_eq!(report["shape"], serde_json::json!([1, 40, 122]));
    let floor = (1e-9f64).ln();
    assert!((report["min"].as_f64().unwrap() - floor).abs() < 1e-3);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn dump_config_prints_defaults() {
    let root = scratch_dir("dump");
    let json = run_json(&[
        "--config",
        root.join("missing.json").to_str().unwrap(),
        "dump-config",
    ]);
    assert_eq!(json["features"]["sample_rate"], 16_000);
    assert_eq!(json["features"]["n_mels"], 64);
    assert_eq!(json["dataset"]["labels"], serde_json::json!(["non_snore", "snore"]));
    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn invalid_config_exits_with_error() {
    let root = scratch_dir("invalid");
    let config = root.join("pipeline.json");
    fs::write(&config, r#"{ "features": { "hop_length": 0 } }"#).unwrap();

    let output = cli()
        .args(["--config", config.to_str().unwrap(), "dump-config"])
        .output()
        .expect("failed to run snore_cli");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("hop_length"), "unexpected stderr: {stderr}");

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn features_without_source_fails() {
    let root = scratch_dir("nosource");
    let output = cli()
        .args([
            "--config",
            root.join("missing.json").to_str().unwrap(),
            "features",
        ])
        .output()
        .expect("failed to run snore_cli");
    assert_eq!(output.status.code(), Some(1));
    fs::remove_dir_all(&root).unwrap();
}
