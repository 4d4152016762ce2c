// Pipeline error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;
use std::path::Path;

/// Pipeline error code constants
///
/// Error code range: 3001-3005
pub struct PipelineErrorCodes {}

impl PipelineErrorCodes {
    /// Source audio unreadable, corrupt, or empty
    pub const DECODE_ERROR: i32 = 3001;

    /// A configuration value violates a precondition
    pub const INVALID_CONFIG: i32 = 3002;

    /// Filterbank and spectrogram frequency dimensions disagree
    pub const SHAPE_MISMATCH: i32 = 3003;

    /// Resampler rejected its input
    pub const RESAMPLE_FAILED: i32 = 3004;

    /// Filesystem operation failed outside the numeric core
    pub const IO_FAILED: i32 = 3005;
}

/// Log a pipeline error with structured context
///
/// Emits the numeric code, the component that failed and the caller-supplied
/// context in a single line.
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    error!(
        "Pipeline error in {}: code={}, component={}, message={}",
        context,
        err.code(),
        err.component(),
        err.message()
    );
}

/// Errors raised by the feature pipeline and its file-facing layers
///
/// Every error here is a precondition failure reported synchronously to the
/// immediate caller. Nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Source audio could not be decoded or contained no samples
    DecodeError { path: String, reason: String },

    /// Configuration value out of range (sizes, window length, frequency bounds)
    InvalidConfig { reason: String },

    /// Matrix dimensions that must agree do not
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Resampler failed while processing
    ResampleFailed { reason: String },

    /// Directory listing or clip writing failed
    Io { path: String, reason: String },
}

impl PipelineError {
    pub fn decode(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        PipelineError::DecodeError {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        PipelineError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, err: impl fmt::Display) -> Self {
        PipelineError::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Name of the pipeline stage that produced this error.
    pub fn component(&self) -> &'static str {
        match self {
            PipelineError::DecodeError { .. } => "Decoder",
            PipelineError::InvalidConfig { .. } => "Config",
            PipelineError::ShapeMismatch { .. } => "FeatureAssembler",
            PipelineError::ResampleFailed { .. } => "Resampler",
            PipelineError::Io { .. } => "Storage",
        }
    }
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::DecodeError { .. } => PipelineErrorCodes::DECODE_ERROR,
            PipelineError::InvalidConfig { .. } => PipelineErrorCodes::INVALID_CONFIG,
            PipelineError::ShapeMismatch { .. } => PipelineErrorCodes::SHAPE_MISMATCH,
            PipelineError::ResampleFailed { .. } => PipelineErrorCodes::RESAMPLE_FAILED,
            PipelineError::Io { .. } => PipelineErrorCodes::IO_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::DecodeError { path, reason } => {
                format!("Failed to decode audio {}: {}", path, reason)
            }
            PipelineError::InvalidConfig { reason } => {
                format!("Invalid configuration: {}", reason)
            }
            PipelineError::ShapeMismatch {
                what,
                expected,
                actual,
            } => {
                format!("Shape mismatch in {}: expected {}, got {}", what, expected, actual)
            }
            PipelineError::ResampleFailed { reason } => {
                format!("Resampling failed: {}", reason)
            }
            PipelineError::Io { path, reason } => {
                format!("I/O failure on {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for PipelineError {}
