//! Card recognition: image in, structured card fields out.
//!
//! Recognition failures never stop a run. The sequence engine substitutes
//! [`CardFields::unknown`] and keeps the physical pipeline moving.

mod config;
mod disabled;
mod error;
mod gemini;
mod parse;
mod traits;
mod types;

pub use config::{GeminiConfig, RecognizerBackend, RecognizerConfig};
pub use disabled::DisabledRecognizer;
pub use error::RecognitionError;
pub use gemini::GeminiRecognizer;
pub use parse::parse_record_line;
pub use traits::Recognizer;
pub use types::{CardFields, FIELD_COUNT, UNKNOWN};

use std::sync::Arc;

/// Factory function to create a recognizer from config
pub fn create_recognizer(config: &RecognizerConfig) -> Arc<dyn Recognizer> {
    match config.backend {
        RecognizerBackend::Gemini => Arc::new(GeminiRecognizer::new(
            config.gemini.clone().unwrap_or_default(),
        )),
        RecognizerBackend::None => Arc::new(DisabledRecognizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_recognizer_none() {
        let recognizer = create_recognizer(&RecognizerConfig::default());
        assert_eq!(recognizer.provider(), "none");
    }

    #[test]
    fn test_create_recognizer_gemini() {
        let config = RecognizerConfig {
            backend: RecognizerBackend::Gemini,
            gemini: Some(GeminiConfig {
                api_key: "key".to_string(),
                ..Default::default()
            }),
        };
        assert_eq!(create_recognizer(&config).provider(), "gemini");
    }
}
