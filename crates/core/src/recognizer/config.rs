//! Recognizer configuration.

use serde::{Deserialize, Serialize};

/// Available recognition backends.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerBackend {
    /// Google Gemini `generateContent` API.
    Gemini,
    /// No recognition; every card is recorded as a placeholder.
    #[default]
    None,
}

/// Configuration for card recognition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizerConfig {
    #[serde(default)]
    pub backend: RecognizerBackend,

    /// Gemini settings (required when backend = "gemini").
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. May be left empty in the file and supplied via environment.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            api_base: default_api_base(),
            timeout_secs: default_timeout(),
        }
    }
}
