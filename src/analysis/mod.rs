// Analysis module - per-clip log-mel feature pipeline
//
// This module turns canonical-rate waveforms into classifier-ready feature
// tensors. All heavy state is computed once at construction and shared
// read-only afterwards, so one pipeline can serve many clips and threads.
//
// Architecture:
// - cache: Build-once filterbank store keyed by configuration
// - features: STFT, mel filterbank and log-mel assembly
// - FeaturePipeline: SpectralAnalyzer -> FeatureAssembler for one config
//
// Data flow per clip:
// Waveform -> PowerSpectrogram [n_freqs, T] -> MelSpectrogram [n_mels, T]
//          -> FeatureTensor [1, n_mels, T]

use std::sync::Arc;
use std::thread;

use tracing::{debug, info, trace};

use crate::audio::Waveform;
use crate::config::FeatureConfig;
use crate::error::{PipelineError, Result};

pub mod cache;
pub mod features;

use cache::FilterbankCache;
use features::{FeatureAssembler, FeatureTensor, MelFilterbank, MelSpectrogram, SpectralAnalyzer};

/// Feature extractor bound to one [`FeatureConfig`]
///
/// Cloning is cheap: the FFT plan, window and filterbank are reference
/// counted and shared between clones.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: FeatureConfig,
    analyzer: SpectralAnalyzer,
    filterbank: Arc<MelFilterbank>,
    assembler: FeatureAssembler,
}

impl FeaturePipeline {
    /// Build a pipeline using the process-wide filterbank cache.
    ///
    /// # Errors
    /// `InvalidConfig` when any configuration value violates a precondition
    pub fn new(config: &FeatureConfig) -> Result<Self> {
        Self::with_cache(config, FilterbankCache::global())
    }

    /// Build a pipeline that takes its filterbank from `cache`.
    pub fn with_cache(config: &FeatureConfig, cache: &FilterbankCache) -> Result<Self> {
        config.validate()?;

        let analyzer = SpectralAnalyzer::new(config.n_fft, config.hop_length)?;
        let filterbank = cache.for_config(config)?;
        let assembler = FeatureAssembler::from_config(config);

        info!(
            sample_rate = config.sample_rate,
            n_fft = config.n_fft,
            hop_length = config.hop_length,
            n_mels = config.n_mels,
            log_mel = config.log_mel_enabled,
            "feature pipeline ready"
        );

        Ok(Self {
            config: config.clone(),
            analyzer,
            filterbank,
            assembler,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn filterbank(&self) -> &Arc<MelFilterbank> {
        &self.filterbank
    }

    pub fn analyzer(&self) -> &SpectralAnalyzer {
        &self.analyzer
    }

    /// Run STFT and mel projection on raw samples at the configured rate.
    pub fn mel_spectrogram(&self, samples: &[f32]) -> Result<MelSpectrogram> {
        let power = self.analyzer.power_spectrogram(samples);
        self.assembler.assemble(&power, &self.filterbank)
    }

    /// Extract the `[1, n_mels, n_frames]` feature tensor of one clip.
    ///
    /// # Errors
    /// `InvalidConfig` when the waveform is not at the configured sample rate
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureTensor> {
        if waveform.sample_rate() != self.config.sample_rate {
            return Err(PipelineError::invalid_config(format!(
                "waveform sample rate {} Hz does not match pipeline rate {} Hz",
                waveform.sample_rate(),
                self.config.sample_rate
            )));
        }

        let tensor = self.mel_spectrogram(waveform.samples())?.into_tensor();
        trace!(
            samples = waveform.len(),
            n_frames = tensor.n_frames,
            "extracted clip features"
        );
        Ok(tensor)
    }

    /// Extract features for many clips on up to `workers` threads.
    ///
    /// Results come back in input order, one per clip; a failing clip does
    /// not stop the others.
    pub fn extract_batch(&self, waveforms: &[Waveform], workers: usize) -> Vec<Result<FeatureTensor>> {
        if waveforms.is_empty() {
            return Vec::new();
        }

        let workers = workers.clamp(1, waveforms.len());
        if workers == 1 {
            return waveforms.iter().map(|w| self.extract(w)).collect();
        }

        let chunk_size = waveforms.len().div_ceil(workers);
        debug!(
            clips = waveforms.len(),
            workers,
            chunk_size,
            "starting batch extraction"
        );

        thread::scope(|scope| {
            let handles: Vec<_> = waveforms
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || chunk.iter().map(|w| self.extract(w)).collect::<Vec<_>>())
                })
                .collect();

            handles
                .into_iter()
                .zip(waveforms.chunks(chunk_size))
                .flat_map(|(handle, chunk)| match handle.join() {
                    Ok(results) => results,
                    Err(_) => chunk
                        .iter()
                        .map(|_| {
                            Err(PipelineError::invalid_config(
                                "feature worker thread panicked",
                            ))
                        })
                        .collect(),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests;
