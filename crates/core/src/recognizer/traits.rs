//! Trait definitions for the recognizer module.

use async_trait::async_trait;
use std::path::Path;

use super::error::RecognitionError;
use super::types::CardFields;

/// Extracts structured card metadata from an image.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Provider name (e.g., "gemini", "none").
    fn provider(&self) -> &str;

    /// Recognize the card shown in the image at `image`.
    async fn recognize(&self, image: &Path) -> Result<CardFields, RecognitionError>;
}
