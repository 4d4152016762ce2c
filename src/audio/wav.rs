// WAV decoding and clip persistence
//
// This is the file-format boundary of the pipeline: everything past it works
// on `DecodedAudio` / `Waveform` values and never touches files.

use std::path::Path;

use crate::audio::resampler::Resampler;
use crate::audio::waveform::{DecodedAudio, Waveform};
use crate::error::{PipelineError, Result};

/// Decode a WAV file into interleaved `f32` samples.
///
/// Float files are read as-is; integer PCM is scaled by `1 / (2^(bits-1) - 1)`.
/// Unreadable, corrupt, or empty files fail with `DecodeError`.
pub fn read_wav(path: &Path) -> Result<DecodedAudio> {
    let mut reader =
        hound::WavReader::open(path).map_err(|err| PipelineError::decode(path, err.to_string()))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| PipelineError::decode(path, err.to_string())))
            .collect::<Result<Vec<f32>>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                8 => reader
                    .samples::<i8>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / max)
                            .map_err(|err| PipelineError::decode(path, err.to_string()))
                    })
                    .collect::<Result<Vec<f32>>>()?,
                16 => reader
                    .samples::<i16>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / max)
                            .map_err(|err| PipelineError::decode(path, err.to_string()))
                    })
                    .collect::<Result<Vec<f32>>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| value as f32 / max)
                            .map_err(|err| PipelineError::decode(path, err.to_string()))
                    })
                    .collect::<Result<Vec<f32>>>()?,
                other => {
                    return Err(PipelineError::decode(
                        path,
                        format!("unsupported bits per sample {}", other),
                    ))
                }
            }
        }
    };

    DecodedAudio::new(
        samples,
        spec.channels,
        spec.sample_rate,
        path.display().to_string(),
    )
}

/// Write a mono waveform as a 32-bit float WAV, preserving samples exactly.
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|err| PipelineError::io(path, err))?;
    for &sample in waveform.samples() {
        writer
            .write_sample(sample)
            .map_err(|err| PipelineError::io(path, err))?;
    }
    writer.finalize().map_err(|err| PipelineError::io(path, err))
}

/// Decode `path`, downmix to mono and resample to `target_rate`.
pub fn load_waveform(path: &Path, target_rate: u32) -> Result<Waveform> {
    let decoded = read_wav(path)?;
    Resampler::new(target_rate)?.process(&decoded)
}
