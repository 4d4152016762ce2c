// Resampler - mono conversion and band-limited sample rate conversion
//
// Input of any channel count is averaged down to mono, then converted to the
// pipeline rate with rubato's FFT-based synchronous resampler. The resampler
// delays its output by a fixed number of frames; that delay is trimmed so the
// result lines up with the input, and the length is fixed at
// ceil(n * target / source).

use rubato::{FftFixedInOut, Resampler as _};
use tracing::debug;

use crate::audio::waveform::{DecodedAudio, Waveform};
use crate::error::{PipelineError, Result};

/// Input frames handed to rubato per call.
const CHUNK_FRAMES: usize = 1024;

/// Converts decoded audio to mono at a fixed target rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    target_rate: u32,
}

impl Resampler {
    pub fn new(target_rate: u32) -> Result<Self> {
        if target_rate == 0 {
            return Err(PipelineError::invalid_config(
                "target sample rate must be > 0",
            ));
        }
        Ok(Self { target_rate })
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Downmix to mono and resample to the target rate.
    ///
    /// Identity (bit-identical samples) when the source is already mono at
    /// the target rate.
    pub fn process(&self, audio: &DecodedAudio) -> Result<Waveform> {
        if audio.frames() == 0 {
            return Err(PipelineError::decode(
                audio.origin(),
                "audio contains no samples",
            ));
        }

        let mono = audio.downmix();
        let samples = resample(&mono, audio.sample_rate(), self.target_rate)?;
        if samples.is_empty() {
            return Err(PipelineError::decode(
                audio.origin(),
                "audio too short to resample",
            ));
        }

        Waveform::new(samples, self.target_rate)
    }

    /// Resample an existing mono waveform.
    pub fn process_waveform(&self, waveform: &Waveform) -> Result<Waveform> {
        if waveform.sample_rate() == self.target_rate {
            return Ok(waveform.clone());
        }
        let samples = resample(waveform.samples(), waveform.sample_rate(), self.target_rate)?;
        Waveform::new(samples, self.target_rate)
    }
}

/// Number of samples produced when converting `input_len` samples.
pub fn resampled_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    let numerator = input_len as u128 * to_rate as u128;
    numerator.div_ceil(from_rate as u128) as usize
}

/// Resample mono samples from `from_rate` to `to_rate`.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(PipelineError::invalid_config(format!(
            "cannot resample from {} Hz to {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_FRAMES, 1)
            .map_err(|err| {
                PipelineError::invalid_config(format!(
                    "resampler rejected {} Hz -> {} Hz: {}",
                    from_rate, to_rate, err
                ))
            })?;

    let expected_len = resampled_len(samples.len(), from_rate, to_rate);
    let delay = resampler.output_delay();
    let chunk_in = resampler.input_frames_next();
    let mut output: Vec<f32> = Vec::with_capacity(expected_len + delay + CHUNK_FRAMES);
    let mut chunk = vec![0.0f32; chunk_in];
    let mut pos = 0usize;

    // Keep feeding (zero-padded past the end) until the delayed tail is flushed.
    while output.len() < expected_len + delay {
        chunk.iter_mut().for_each(|s| *s = 0.0);
        if pos < samples.len() {
            let end = (pos + chunk_in).min(samples.len());
            chunk[..end - pos].copy_from_slice(&samples[pos..end]);
        }
        pos += chunk_in;

        let processed = resampler
            .process(&[chunk.as_slice()], None)
            .map_err(|err| PipelineError::ResampleFailed {
                reason: err.to_string(),
            })?;
        if let Some(channel) = processed.first() {
            output.extend_from_slice(channel);
        }
    }

    output.drain(..delay);
    output.truncate(expected_len);

    debug!(
        from_rate,
        to_rate,
        input = samples.len(),
        output = output.len(),
        "resampled waveform"
    );

    Ok(output)
}
