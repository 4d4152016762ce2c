// Snore Detector Core - offline audio feature pipeline
// Raw recordings -> canonical-rate clips -> log-mel feature tensors

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;

// Re-exports for convenience
pub use analysis::cache::{FilterbankCache, FilterbankKey};
pub use analysis::features::{
    FeatureAssembler, FeatureTensor, MelFilterbank, MelSpectrogram, PowerSpectrogram,
    SpectralAnalyzer,
};
pub use analysis::FeaturePipeline;
pub use audio::{DecodedAudio, Label, LabelSet, Resampler, Waveform};
pub use config::{AppConfig, DatasetConfig, FeatureConfig, NormalizationConfig};
pub use dataset::ClipDataset;
pub use error::{ErrorCode, PipelineError, Result};
