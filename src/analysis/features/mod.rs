// Features - log-mel feature extraction for snore classification
//
// Module organization:
// - types: Dense matrices (Matrix, PowerSpectrogram, MelSpectrogram, FeatureTensor)
// - fft: Windowed STFT producing power spectra
// - mel: Triangular mel filterbank construction
// - mod.rs: FeatureAssembler (filterbank projection + log compression)
//
// Per clip: power = |STFT(x)|^2, mel = filterbank . power, out = ln(mel + eps)

pub mod fft;
pub mod mel;
mod types;

pub use fft::{frame_count, hann_window, SpectralAnalyzer};
pub use mel::{hz_to_mel, mel_to_hz, BandEdges, MelFilterbank};
pub use types::{FeatureTensor, Matrix, MelSpectrogram, PowerSpectrogram};

use crate::config::{FeatureConfig, NormalizationConfig};
use crate::error::{PipelineError, Result};

/// Default floor added before taking the logarithm.
pub const DEFAULT_EPS: f32 = 1e-9;

/// Projects power spectrograms onto the mel filterbank
///
/// Inputs are borrowed and never mutated; every call returns a freshly
/// allocated spectrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureAssembler {
    log_mel_enabled: bool,
    eps: f32,
    normalization: Option<NormalizationConfig>,
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self {
            log_mel_enabled: true,
            eps: DEFAULT_EPS,
            normalization: None,
        }
    }
}

impl FeatureAssembler {
    pub fn new(log_mel_enabled: bool, eps: f32) -> Self {
        Self {
            log_mel_enabled,
            eps,
            normalization: None,
        }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self {
            log_mel_enabled: config.log_mel_enabled,
            eps: config.eps,
            normalization: config.normalization,
        }
    }

    /// Clamp and rescale log-mel values into `[0, 1]` after compression.
    pub fn with_normalization(mut self, normalization: NormalizationConfig) -> Self {
        self.normalization = Some(normalization);
        self
    }

    pub fn log_mel_enabled(&self) -> bool {
        self.log_mel_enabled
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Compute `filterbank . power`, then apply log compression if enabled.
    ///
    /// # Returns
    /// Mel spectrogram `[n_mels, n_frames]`; zero frames in gives zero frames out
    ///
    /// # Errors
    /// `ShapeMismatch` when the filterbank and spectrogram bin counts differ
    pub fn assemble(
        &self,
        power: &PowerSpectrogram,
        filterbank: &MelFilterbank,
    ) -> Result<MelSpectrogram> {
        if filterbank.n_freqs() != power.n_freqs() {
            return Err(PipelineError::ShapeMismatch {
                what: "frequency bins",
                expected: filterbank.n_freqs(),
                actual: power.n_freqs(),
            });
        }

        let n_frames = power.n_frames();
        let mut mel = Matrix::zeros(filterbank.n_mels(), n_frames);

        for (band, edges) in filterbank.edges().iter().enumerate() {
            let weights = filterbank.weights().row(band);
            let out = mel.row_mut(band);
            let span = edges.left..edges.right.max(edges.left);
            for bin in span {
                let w = weights[bin];
                if w == 0.0 {
                    continue;
                }
                for (acc, &p) in out.iter_mut().zip(power.matrix().row(bin)) {
                    *acc += w * p;
                }
            }
        }

        if self.log_mel_enabled {
            let eps = self.eps;
            mel.as_mut_slice()
                .iter_mut()
                .for_each(|value| *value = (*value + eps).ln());

            if let Some(NormalizationConfig { min_db, max_db }) = self.normalization {
                let range = max_db - min_db;
                mel.as_mut_slice()
                    .iter_mut()
                    .for_each(|value| *value = (value.clamp(min_db, max_db) - min_db) / range);
            }
        }

        Ok(MelSpectrogram(mel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synthetic::{sine, white_noise};

    fn default_parts() -> (SpectralAnalyzer, MelFilterbank) {
        (
            SpectralAnalyzer::new(1024, 256).unwrap(),
            MelFilterbank::build(1024, 64, 16_000, 0.0, 8_000.0).unwrap(),
        )
    }

    /// Straightforward triple loop used as a reference for the sparse product.
    fn dense_product(fb: &MelFilterbank, power: &PowerSpectrogram) -> Vec<f32> {
        let mut out = vec![0.0f32; fb.n_mels() * power.n_frames()];
        for m in 0..fb.n_mels() {
            for t in 0..power.n_frames() {
                let mut acc = 0.0f64;
                for f in 0..fb.n_freqs() {
                    acc += fb.weights().get(m, f) as f64 * power.matrix().get(f, t) as f64;
                }
                out[m * power.n_frames() + t] = acc as f32;
            }
        }
        out
    }

    #[test]
    fn test_one_second_clip_shape() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&white_noise(16_000, 0.5, 1));
        let mel = FeatureAssembler::default().assemble(&power, &fb).unwrap();
        assert_eq!(mel.n_mels(), 64);
        assert_eq!(mel.n_frames(), 59);
        assert_eq!(mel.into_tensor().shape(), [1, 64, 59]);
    }

    #[test]
    fn test_silence_maps_to_log_eps() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&vec![0.0; 16_000]);
        let mel = FeatureAssembler::default().assemble(&power, &fb).unwrap();
        let expected = DEFAULT_EPS.ln();
        for &value in mel.matrix().as_slice() {
            assert!(value.is_finite());
            assert!((value - expected).abs() < 1e-5, "got {}", value);
        }
    }

    #[test]
    fn test_zero_frames_is_not_an_error() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&vec![0.5; 512]);
        let mel = FeatureAssembler::default().assemble(&power, &fb).unwrap();
        assert_eq!(mel.matrix().shape(), (64, 0));
    }

    #[test]
    fn test_shape_mismatch_detected() {
        let analyzer = SpectralAnalyzer::new(512, 128).unwrap();
        let fb = MelFilterbank::build(1024, 64, 16_000, 0.0, 8_000.0).unwrap();
        let power = analyzer.power_spectrogram(&vec![0.0; 2_048]);
        match FeatureAssembler::default().assemble(&power, &fb) {
            Err(PipelineError::ShapeMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 513);
                assert_eq!(actual, 257);
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_output_matches_dense_product() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&white_noise(4_096, 0.8, 21));
        let mel = FeatureAssembler::new(false, DEFAULT_EPS)
            .assemble(&power, &fb)
            .unwrap();
        let reference = dense_product(&fb, &power);
        for (got, want) in mel.matrix().as_slice().iter().zip(&reference) {
            assert!(
                (got - want).abs() <= 1e-4 * want.abs().max(1e-3),
                "got {}, expected {}",
                got,
                want
            );
        }
    }

    #[test]
    fn test_log_is_applied_elementwise() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&sine(16_000, 440.0, 4_096, 0.5));
        let linear = FeatureAssembler::new(false, DEFAULT_EPS)
            .assemble(&power, &fb)
            .unwrap();
        let logged = FeatureAssembler::new(true, DEFAULT_EPS)
            .assemble(&power, &fb)
            .unwrap();
        for (&lin, &log) in linear.matrix().as_slice().iter().zip(logged.matrix().as_slice()) {
            assert_eq!(log, (lin + DEFAULT_EPS).ln());
        }
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&white_noise(2_048, 0.5, 8));
        let power_before = power.clone();
        let fb_before = fb.clone();
        FeatureAssembler::default().assemble(&power, &fb).unwrap();
        assert_eq!(power, power_before);
        assert_eq!(fb, fb_before);
    }

    #[test]
    fn test_normalization_bounds_output() {
        let (analyzer, fb) = default_parts();
        let power = analyzer.power_spectrogram(&white_noise(16_000, 1.0, 2));
        let assembler = FeatureAssembler::default().with_normalization(NormalizationConfig::default());
        let mel = assembler.assemble(&power, &fb).unwrap();
        assert!(mel
            .matrix()
            .as_slice()
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v)));

        // Silence sits at ln(1e-9) ~ -20.7, i.e. (80 - 20.7) / 80 after rescaling
        let silent = assembler
            .assemble(&analyzer.power_spectrogram(&vec![0.0; 2_048]), &fb)
            .unwrap();
        let expected = (DEFAULT_EPS.ln() + 80.0) / 80.0;
        assert!((silent.matrix().get(0, 0) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_tone_energy_lands_in_matching_band() {
        let (analyzer, fb) = default_parts();
        // 1 kHz sits on FFT bin 64
        let power = analyzer.power_spectrogram(&sine(16_000, 1_000.0, 16_000, 1.0));
        let mel = FeatureAssembler::default().assemble(&power, &fb).unwrap();
        let loudest = (0..mel.n_mels())
            .max_by(|&a, &b| {
                mel.matrix()
                    .get(a, 10)
                    .partial_cmp(&mel.matrix().get(b, 10))
                    .unwrap()
            })
            .unwrap();
        let edges = fb.edges()[loudest];
        assert!(
            edges.left <= 64 && 64 < edges.right,
            "band {} spans {:?}",
            loudest,
            edges
        );
    }
}
