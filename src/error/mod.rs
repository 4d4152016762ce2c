// Error types for the snore detector feature pipeline
//
// This module defines the error taxonomy shared by the numeric core and the
// file-facing layers around it. Every variant carries a stable numeric code
// so reports and the CLI can surface failures uniformly.

mod pipeline;

pub use pipeline::{log_pipeline_error, PipelineError, PipelineErrorCodes};

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
