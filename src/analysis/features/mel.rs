// Mel module - triangular mel filterbank
//
// Uses the HTK mel scale: mel(f) = 2595 * log10(1 + f / 700).
//
// Algorithm:
// 1. Convert f_min / f_max to mel
// 2. Place n_mels + 2 equally spaced points between them and map back to Hz
// 3. Snap each point to an FFT bin: floor((n_fft + 1) * hz / sample_rate)
// 4. Band i rises over [b_i, b_{i+1}) and falls over [b_{i+1}, b_{i+2})
//
// Ramps use linspace semantics: a ramp of n bins holds n evenly spaced values
// including both endpoints, and a single-bin ramp holds only its first value.
// Adjacent boundaries that collapse onto the same bin leave that ramp empty.

use crate::config::{validate_frequency_range, FeatureConfig};
use crate::error::{PipelineError, Result};

use super::types::Matrix;

/// Convert a frequency in Hz to the HTK mel scale.
pub fn hz_to_mel(freq: f64) -> f64 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

/// Convert a mel value back to Hz.
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// The first half steps forward from `start` and the second half steps back
/// from `end`, so both endpoints are exact.
fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n).map(move |i| {
        if i < n / 2 {
            start + step * i as f64
        } else {
            end - step * (n - 1 - i) as f64
        }
    })
}

/// FFT-bin boundaries of one triangular band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandEdges {
    pub left: usize,
    pub center: usize,
    pub right: usize,
}

/// Dense `[n_mels, n_fft / 2 + 1]` weight matrix mapping power bins to mel bands
///
/// Pure configuration-derived data: built once, then shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct MelFilterbank {
    weights: Matrix,
    edges: Vec<BandEdges>,
    n_fft: usize,
    sample_rate: u32,
    f_min: f64,
    f_max: f64,
}

impl MelFilterbank {
    /// Build the filterbank for the given configuration.
    ///
    /// Degenerate bands (all-zero rows) are allowed; they occur when adjacent
    /// mel points snap to the same FFT bin at low frequencies.
    pub fn build(
        n_fft: usize,
        n_mels: usize,
        sample_rate: u32,
        f_min: f64,
        f_max: f64,
    ) -> Result<Self> {
        if n_fft == 0 {
            return Err(PipelineError::invalid_config("n_fft must be > 0"));
        }
        if n_mels == 0 {
            return Err(PipelineError::invalid_config("n_mels must be > 0"));
        }
        if sample_rate == 0 {
            return Err(PipelineError::invalid_config("sample_rate must be > 0"));
        }
        validate_frequency_range(f_min, f_max, sample_rate)?;

        let n_freqs = n_fft / 2 + 1;
        let mel_min = hz_to_mel(f_min);
        let mel_max = hz_to_mel(f_max);

        let bins: Vec<usize> = linspace(mel_min, mel_max, n_mels + 2)
            .map(mel_to_hz)
            .map(|hz| {
                let bin = ((n_fft + 1) as f64 * hz / sample_rate as f64).floor();
                (bin.max(0.0) as usize).min(n_freqs)
            })
            .collect();

        let mut weights = Matrix::zeros(n_mels, n_freqs);
        let mut edges = Vec::with_capacity(n_mels);

        for band in 0..n_mels {
            let left = bins[band];
            let center = bins[band + 1];
            let right = bins[band + 2];
            let row = weights.row_mut(band);

            if center > left {
                for (slot, value) in row[left..center]
                    .iter_mut()
                    .zip(linspace(0.0, 1.0, center - left))
                {
                    *slot = value as f32;
                }
            }
            if right > center {
                for (slot, value) in row[center..right]
                    .iter_mut()
                    .zip(linspace(1.0, 0.0, right - center))
                {
                    *slot = value as f32;
                }
            }

            edges.push(BandEdges {
                left,
                center,
                right,
            });
        }

        Ok(Self {
            weights,
            edges,
            n_fft,
            sample_rate,
            f_min,
            f_max,
        })
    }

    /// Build from the pipeline configuration.
    pub fn from_config(config: &FeatureConfig) -> Result<Self> {
        Self::build(
            config.n_fft,
            config.n_mels,
            config.sample_rate,
            config.f_min,
            config.f_max_hz(),
        )
    }

    pub fn n_mels(&self) -> usize {
        self.weights.rows()
    }

    pub fn n_freqs(&self) -> usize {
        self.weights.cols()
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frequency_range(&self) -> (f64, f64) {
        (self.f_min, self.f_max)
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn edges(&self) -> &[BandEdges] {
        &self.edges
    }

    /// Indices of bands whose weights are all zero.
    pub fn degenerate_bands(&self) -> Vec<usize> {
        (0..self.n_mels())
            .filter(|&band| self.weights.row(band).iter().all(|&w| w == 0.0))
            .collect()
    }
}
