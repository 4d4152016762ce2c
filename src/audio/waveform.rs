// Waveform types - decoded audio handed to the pipeline
//
// `DecodedAudio` is what the decoding boundary produces (any channel count,
// any rate). `Waveform` is the mono signal every later stage works on.

use crate::error::{PipelineError, Result};

/// Origin string used for audio that did not come from a file.
pub const IN_MEMORY_ORIGIN: &str = "<memory>";

/// Interleaved multi-channel samples as produced by a decoder
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    origin: String,
}

impl DecodedAudio {
    /// Wrap interleaved samples
    ///
    /// Fails with `DecodeError` when there is no complete frame of audio,
    /// and with `InvalidConfig` when the channel count or rate is zero.
    pub fn new(
        samples: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        origin: impl Into<String>,
    ) -> Result<Self> {
        let origin = origin.into();
        if channels == 0 {
            return Err(PipelineError::invalid_config(format!(
                "{} declares zero channels",
                origin
            )));
        }
        if sample_rate == 0 {
            return Err(PipelineError::invalid_config(format!(
                "{} declares a sample rate of 0 Hz",
                origin
            )));
        }
        if samples.len() < channels as usize {
            return Err(PipelineError::decode(origin, "audio contains no samples"));
        }
        if samples.len() % channels as usize != 0 {
            return Err(PipelineError::decode(
                origin,
                format!(
                    "{} samples do not divide into {} channels",
                    samples.len(),
                    channels
                ),
            ));
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
            origin,
        })
    }

    /// Mono audio that did not come from a file
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(samples, 1, sample_rate, IN_MEMORY_ORIGIN)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn interleaved(&self) -> &[f32] {
        &self.samples
    }

    /// Average all channels of each frame into a single mono sample.
    pub fn downmix(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Mono floating-point signal at a known sample rate
///
/// Never empty and never at 0 Hz. Stages return new waveforms instead of
/// mutating the one they were given.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(PipelineError::invalid_config(
                "waveform sample rate must be > 0",
            ));
        }
        if samples.is_empty() {
            return Err(PipelineError::decode(
                IN_MEMORY_ORIGIN,
                "waveform contains no samples",
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
