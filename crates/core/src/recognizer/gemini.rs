//! Recognition through the Gemini `generateContent` API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::config::GeminiConfig;
use super::error::RecognitionError;
use super::parse::parse_record_line;
use super::traits::Recognizer;
use super::types::CardFields;

const PROMPT: &str = "\
You are cataloguing a collectible trading card from a photo. Answer with exactly one \
line of 17 values separated by semicolons, in this order:
name;edition;card number;language;publisher;release year;region;rarity;card type;subtype;\
color;special effects;limitation;autograph;memorabilia;condition;market value

Notes:
- card number: the number within the edition. A number containing a slash is a \
limitation number, not a card number.
- limitation: promo or numbered print, with the number in parentheses, e.g. \"Promo (23/100)\".
- condition: one of Mint, Pack Fresh, Light Wear, Visible Wear, Heavy Wear, Damaged, Destroyed.
- market value: current estimate including currency, adjusted for condition.

Use \"unknown\" for anything you cannot determine. Do not use semicolons inside values. \
Return only the line, no header and no explanation.";

/// Gemini-backed recognizer.
pub struct GeminiRecognizer {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiRecognizer {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn mime_type(image: &Path) -> &'static str {
        match image
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            _ => "image/jpeg",
        }
    }

    fn build_request(image: &Path, bytes: &[u8]) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: Self::mime_type(image).to_string(),
                            data: STANDARD.encode(bytes),
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pull the first text part out of a `generateContent` response.
fn extract_text(response: GenerateResponse) -> Result<String, RecognitionError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .ok_or_else(|| RecognitionError::UnexpectedResponse("no candidate text".to_string()))
}

#[async_trait]
impl Recognizer for GeminiRecognizer {
    fn provider(&self) -> &str {
        "gemini"
    }

    async fn recognize(&self, image: &Path) -> Result<CardFields, RecognitionError> {
        if self.config.api_key.is_empty() {
            return Err(RecognitionError::NotConfigured);
        }

        let bytes = tokio::fs::read(image)
            .await
            .map_err(|source| RecognitionError::ImageRead {
                path: image.to_path_buf(),
                source,
            })?;

        let request = Self::build_request(image, &bytes);
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::Timeout(timeout)
                } else {
                    RecognitionError::Http(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(RecognitionError::Api { status, message });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::UnexpectedResponse(e.to_string()))?;

        let text = extract_text(body)?;
        debug!(image = %image.display(), response = %text, "recognition answer");
        parse_record_line(&text)
    }
}
