// Inspect - sanity checks for stored clips
//
// Reads the first clip of a label directory (sorted by name) and compares
// its sample rate and duration with the configuration. Problems are
// reported as warnings, not errors.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::audio::read_wav;
use crate::config::FeatureConfig;
use crate::error::Result;

use super::list_wav_files;

/// Accepted deviation of a clip's duration from the configured one.
pub const DEFAULT_DURATION_TOLERANCE_SECONDS: f64 = 0.05;

/// Problem found while checking a label directory
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipWarning {
    NoClips,
    SampleRateMismatch { expected: u32, actual: u32 },
    DurationMismatch { expected: f64, actual: f64 },
}

/// Summary of one label directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipCheckReport {
    pub label: String,
    pub clip_count: usize,
    pub first_clip: Option<PathBuf>,
    pub sample_rate: Option<u32>,
    pub duration_seconds: Option<f64>,
    pub expected_sample_rate: u32,
    pub expected_duration_seconds: f64,
    pub warnings: Vec<ClipWarning>,
}

impl ClipCheckReport {
    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Check `clips_root/label` with the default duration tolerance.
pub fn check_split(clips_root: &Path, label: &str, config: &FeatureConfig) -> Result<ClipCheckReport> {
    check_split_with_tolerance(clips_root, label, config, DEFAULT_DURATION_TOLERANCE_SECONDS)
}

/// Check `clips_root/label`, flagging durations off by more than `tolerance_seconds`.
///
/// # Errors
/// `DecodeError` when the first clip cannot be read, `Io` when the directory
/// cannot be listed
pub fn check_split_with_tolerance(
    clips_root: &Path,
    label: &str,
    config: &FeatureConfig,
    tolerance_seconds: f64,
) -> Result<ClipCheckReport> {
    let files = list_wav_files(&clips_root.join(label))?;

    let mut report = ClipCheckReport {
        label: label.to_string(),
        clip_count: files.len(),
        first_clip: None,
        sample_rate: None,
        duration_seconds: None,
        expected_sample_rate: config.sample_rate,
        expected_duration_seconds: config.clip_duration_seconds,
        warnings: Vec::new(),
    };

    let Some(first) = files.first() else {
        warn!(label, "no clips found");
        report.warnings.push(ClipWarning::NoClips);
        return Ok(report);
    };

    let audio = read_wav(first)?;
    let duration = audio.frames() as f64 / audio.sample_rate() as f64;

    if audio.sample_rate() != config.sample_rate {
        warn!(
            label,
            expected = config.sample_rate,
            actual = audio.sample_rate(),
            "sample rate mismatch"
        );
        report.warnings.push(ClipWarning::SampleRateMismatch {
            expected: config.sample_rate,
            actual: audio.sample_rate(),
        });
    }
    if (duration - config.clip_duration_seconds).abs() > tolerance_seconds {
        warn!(
            label,
            expected = config.clip_duration_seconds,
            actual = duration,
            "clip duration mismatch"
        );
        report.warnings.push(ClipWarning::DurationMismatch {
            expected: config.clip_duration_seconds,
            actual: duration,
        });
    }

    info!(
        label,
        clips = report.clip_count,
        sample_rate = audio.sample_rate(),
        duration,
        "checked clips"
    );

    report.first_clip = Some(first.clone());
    report.sample_rate = Some(audio.sample_rate());
    report.duration_seconds = Some(duration);
    Ok(report)
}
