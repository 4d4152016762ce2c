// Types module - dense matrices flowing through the feature pipeline
//
// Every matrix is row-major with its dimensions fixed at construction.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Row-major dense `f32` matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap `data`, which must hold exactly `rows * cols` values.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(PipelineError::ShapeMismatch {
                what: "matrix element count",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Power spectrogram, shape `[n_fft / 2 + 1, n_frames]`
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrogram(pub(crate) Matrix);

impl PowerSpectrogram {
    pub fn n_freqs(&self) -> usize {
        self.0.rows()
    }

    pub fn n_frames(&self) -> usize {
        self.0.cols()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.0
    }
}

/// Mel spectrogram, shape `[n_mels, n_frames]`
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram(pub(crate) Matrix);

impl MelSpectrogram {
    pub fn n_mels(&self) -> usize {
        self.0.rows()
    }

    pub fn n_frames(&self) -> usize {
        self.0.cols()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.0
    }

    /// Prepend the single channel dimension expected by 2-D classifiers.
    pub fn into_tensor(self) -> FeatureTensor {
        let (n_mels, n_frames) = self.0.shape();
        FeatureTensor {
            n_mels,
            n_frames,
            data: self.0.into_vec(),
        }
    }
}

/// Terminal feature handed to the classifier, shape `[1, n_mels, n_frames]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTensor {
    pub n_mels: usize,
    pub n_frames: usize,
    /// Row-major `[n_mels, n_frames]` values
    pub data: Vec<f32>,
}

impl FeatureTensor {
    pub fn shape(&self) -> [usize; 3] {
        [1, self.n_mels, self.n_frames]
    }

    pub fn get(&self, mel: usize, frame: usize) -> f32 {
        self.data[mel * self.n_frames + frame]
    }
}
