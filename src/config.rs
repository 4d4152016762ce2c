//! Configuration for the feature pipeline and the dataset tooling
//!
//! All pipeline constants live in an explicit, immutable [`FeatureConfig`]
//! value that is handed to each component constructor. Two pipelines with
//! different configurations can coexist in one process. Values can be
//! loaded from a JSON file so experiments do not need a rebuild.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::features::frame_count;
use crate::error::{PipelineError, Result};

/// Default configuration file looked up by [`AppConfig::load`].
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub features: FeatureConfig,
    pub dataset: DatasetConfig,
}

/// Signal-processing parameters shared by every clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Canonical pipeline sample rate in Hz
    pub sample_rate: u32,
    /// FFT size (and analysis window length) in samples
    pub n_fft: usize,
    /// Stride between consecutive analysis frames
    pub hop_length: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// Lowest filterbank frequency in Hz
    pub f_min: f64,
    /// Highest filterbank frequency in Hz (Nyquist when unset)
    pub f_max: Option<f64>,
    /// Length of each stored clip in seconds
    pub clip_duration_seconds: f64,
    /// Apply `ln(x + eps)` to the mel spectrogram
    pub log_mel_enabled: bool,
    /// Floor added before the logarithm
    pub eps: f32,
    /// Optional clamp-and-rescale applied after log compression
    pub normalization: Option<NormalizationConfig>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            n_fft: 1024,
            hop_length: 256,
            n_mels: 64,
            f_min: 0.0,
            f_max: None,
            clip_duration_seconds: 1.0,
            log_mel_enabled: true,
            eps: 1e-9,
            normalization: None,
        }
    }
}

/// Fixed-range normalization of log-mel values into `[0, 1]`
///
/// Values are clamped to `[min_db, max_db]` and then rescaled linearly,
/// so `min_db` maps to 0.0 and `max_db` to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            min_db: -80.0,
            max_db: 0.0,
        }
    }
}

impl FeatureConfig {
    /// Number of frequency bins produced by the STFT (`n_fft / 2 + 1`).
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Upper filterbank frequency, defaulting to Nyquist.
    pub fn f_max_hz(&self) -> f64 {
        self.f_max.unwrap_or(self.sample_rate as f64 / 2.0)
    }

    /// Samples per clip, rounded to the nearest whole sample.
    pub fn clip_samples(&self) -> usize {
        (self.clip_duration_seconds * self.sample_rate as f64).round() as usize
    }

    /// Frames the STFT yields for a waveform of `n_samples`.
    pub fn frames_for(&self, n_samples: usize) -> usize {
        frame_count(n_samples, self.n_fft, self.hop_length)
    }

    /// Check every precondition the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PipelineError::invalid_config("sample_rate must be > 0"));
        }
        if self.n_fft == 0 {
            return Err(PipelineError::invalid_config("n_fft must be > 0"));
        }
        if self.hop_length == 0 {
            return Err(PipelineError::invalid_config("hop_length must be > 0"));
        }
        if self.n_mels == 0 {
            return Err(PipelineError::invalid_config("n_mels must be > 0"));
        }
        if !(self.clip_duration_seconds > 0.0) || self.clip_samples() == 0 {
            return Err(PipelineError::invalid_config(format!(
                "clip_duration_seconds must yield at least one sample (got {})",
                self.clip_duration_seconds
            )));
        }
        if !(self.eps > 0.0) || !self.eps.is_finite() {
            return Err(PipelineError::invalid_config(format!(
                "eps must be a positive finite number (got {})",
                self.eps
            )));
        }
        validate_frequency_range(self.f_min, self.f_max_hz(), self.sample_rate)?;
        if let Some(norm) = self.normalization {
            if !(norm.min_db < norm.max_db) {
                return Err(PipelineError::invalid_config(format!(
                    "normalization min_db ({}) must be below max_db ({})",
                    norm.min_db, norm.max_db
                )));
            }
        }
        Ok(())
    }
}

/// Shared frequency-bound check used by the config and the filterbank builder.
pub(crate) fn validate_frequency_range(f_min: f64, f_max: f64, sample_rate: u32) -> Result<()> {
    let nyquist = sample_rate as f64 / 2.0;
    if !f_min.is_finite() || f_min < 0.0 {
        return Err(PipelineError::invalid_config(format!(
            "f_min must be >= 0 (got {})",
            f_min
        )));
    }
    if !f_max.is_finite() || f_min >= f_max {
        return Err(PipelineError::invalid_config(format!(
            "f_min ({}) must be below f_max ({})",
            f_min, f_max
        )));
    }
    if f_max > nyquist {
        return Err(PipelineError::invalid_config(format!(
            "f_max ({}) exceeds Nyquist ({})",
            f_max, nyquist
        )));
    }
    Ok(())
}

/// Dataset layout and batch settings for the preprocessing tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Class names; a label's id is its position in this list
    pub labels: Vec<String>,
    /// Root of the raw recordings (`<raw_dir>/<label>/*.wav`)
    pub raw_dir: PathBuf,
    /// Root of the sliced clips (`<clips_dir>/<label>/*.wav`)
    pub clips_dir: PathBuf,
    /// Accepted deviation of a stored clip from the configured duration
    pub duration_tolerance_seconds: f64,
    /// Worker threads used for batch feature extraction
    pub workers: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            labels: vec!["non_snore".to_string(), "snore".to_string()],
            raw_dir: PathBuf::from("data/raw"),
            clips_dir: PathBuf::from("data/clips"),
            duration_tolerance_seconds: 0.05,
            workers: 4,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// its JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Validate the feature parameters and the dataset layout
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        if self.dataset.labels.is_empty() {
            return Err(PipelineError::invalid_config(
                "dataset.labels must name at least one class",
            ));
        }
        if self.dataset.workers == 0 {
            return Err(PipelineError::invalid_config("dataset.workers must be > 0"));
        }
        Ok(())
    }
}
