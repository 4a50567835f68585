//! Error type for recognition.

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur while recognizing a card image.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("empty recognition result")]
    EmptyResult,

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("recognition not configured")]
    NotConfigured,
}
