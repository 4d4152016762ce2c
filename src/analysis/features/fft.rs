// FFT module - short-time power spectrum
//
// Framing is left-aligned and non-centered: frame k covers samples
// [k * hop, k * hop + n_fft) and only frames that fit entirely inside the
// waveform are analysed. There is no reflect or zero padding at either edge.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::types::{Matrix, PowerSpectrogram};
use crate::error::{PipelineError, Result};

/// Symmetric Hann window: `w[i] = 0.5 - 0.5 * cos(2*pi*i / (n - 1))`.
///
/// A window of length 1 is `[1.0]`.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| {
            0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / (n as f32 - 1.0)).cos())
        })
        .collect()
}

/// Frames a waveform needs for the given FFT size and hop.
pub fn frame_count(n_samples: usize, n_fft: usize, hop_length: usize) -> usize {
    if hop_length == 0 || n_fft == 0 || n_samples < n_fft {
        0
    } else {
        (n_samples - n_fft) / hop_length + 1
    }
}

/// Windowed STFT producing squared-magnitude spectra
///
/// The FFT plan and window are computed once at construction and shared by
/// every call, so one analyzer can serve many clips and many threads.
#[derive(Clone)]
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    n_fft: usize,
    hop_length: usize,
    window: Arc<[f32]>,
}

impl std::fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Create an analyzer with a symmetric Hann window of length `n_fft`.
    pub fn new(n_fft: usize, hop_length: usize) -> Result<Self> {
        Self::with_window(n_fft, hop_length, hann_window(n_fft))
    }

    /// Create an analyzer with a caller-supplied window.
    ///
    /// Fails with `InvalidConfig` if `n_fft` or `hop_length` is zero or the
    /// window length differs from `n_fft`.
    pub fn with_window(n_fft: usize, hop_length: usize, window: Vec<f32>) -> Result<Self> {
        if n_fft == 0 {
            return Err(PipelineError::invalid_config("n_fft must be > 0"));
        }
        if hop_length == 0 {
            return Err(PipelineError::invalid_config("hop_length must be > 0"));
        }
        if window.len() != n_fft {
            return Err(PipelineError::invalid_config(format!(
                "window length {} does not match n_fft {}",
                window.len(),
                n_fft
            )));
        }

        let fft = FftPlanner::new().plan_fft_forward(n_fft);

        Ok(Self {
            fft,
            n_fft,
            hop_length,
            window: window.into(),
        })
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Non-redundant bins per frame (`n_fft / 2 + 1`).
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Compute the power spectrogram `[n_fft / 2 + 1, n_frames]`.
    ///
    /// Returns zero frames when the input is shorter than `n_fft`.
    pub fn power_spectrogram(&self, samples: &[f32]) -> PowerSpectrogram {
        let n_frames = frame_count(samples.len(), self.n_fft, self.hop_length);
        let n_freqs = self.n_freqs();
        let mut power = Matrix::zeros(n_freqs, n_frames);

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for frame in 0..n_frames {
            let start = frame * self.hop_length;
            let frame_samples = &samples[start..start + self.n_fft];

            for ((slot, &sample), &w) in buffer.iter_mut().zip(frame_samples).zip(self.window.iter())
            {
                *slot = Complex::new(sample * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (bin, value) in buffer[..n_freqs].iter().enumerate() {
                power.set(bin, frame, value.norm_sqr());
            }
        }

        PowerSpectrogram(power)
    }
}
