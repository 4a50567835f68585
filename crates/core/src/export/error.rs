//! Error types for the export module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the target directory.
    #[error("failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the file.
    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}
