// Deterministic synthetic signals
//
// Used by tests and by the CLI to exercise the pipeline without audio files.
// White noise is seeded so repeated runs produce identical samples.

use clap::ValueEnum;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Supported synthetic patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    Sine,
    WhiteNoise,
    Silence,
    ImpulseTrain,
}

/// Pure tone.
pub fn sine(sample_rate: u32, frequency: f32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Uniform white noise in `[-amplitude, amplitude)` from a seeded generator.
pub fn white_noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(-1.0f32..1.0) * amplitude)
        .collect()
}

/// Unit impulses every `period` samples, starting at 0.
pub fn impulse_train(len: usize, period: usize, amplitude: f32) -> Vec<f32> {
    let period = period.max(1);
    (0..len)
        .map(|i| if i % period == 0 { amplitude } else { 0.0 })
        .collect()
}

/// Generate `len` samples of `pattern`.
pub fn generate(
    pattern: SyntheticPattern,
    sample_rate: u32,
    len: usize,
    frequency: f32,
    amplitude: f32,
    seed: u64,
) -> Vec<f32> {
    match pattern {
        SyntheticPattern::Sine => sine(sample_rate, frequency, len, amplitude),
        SyntheticPattern::WhiteNoise => white_noise(len, amplitude, seed),
        SyntheticPattern::Silence => vec![0.0; len],
        SyntheticPattern::ImpulseTrain => {
            let period = (sample_rate as f32 / frequency.max(1e-3)).round() as usize;
            impulse_train(len, period, amplitude)
        }
    }
}
