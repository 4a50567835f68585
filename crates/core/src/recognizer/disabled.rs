//! Recognizer used when no recognition backend is configured.

use async_trait::async_trait;
use std::path::Path;

use super::error::RecognitionError;
use super::traits::Recognizer;
use super::types::CardFields;

/// Fails every request, so each slot is recorded as a placeholder.
#[derive(Debug, Default)]
pub struct DisabledRecognizer;

#[async_trait]
impl Recognizer for DisabledRecognizer {
    fn provider(&self) -> &str {
        "none"
    }

    async fn recognize(&self, _image: &Path) -> Result<CardFields, RecognitionError> {
        Err(RecognitionError::NotConfigured)
    }
}
