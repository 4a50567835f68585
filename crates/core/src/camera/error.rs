//! Error types for the camera module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while capturing an image.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Capture program not found.
    #[error("capture program not found: {program}")]
    ProgramNotFound { program: String },

    /// Capture program exited unsuccessfully.
    #[error("capture failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// Capture did not finish in time.
    #[error("capture timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The program reported success but no image was written.
    #[error("no image written to {path}")]
    MissingOutput { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Creates a capture failed error with optional stderr output.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }
}
