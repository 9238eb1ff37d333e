//! Client for the Gemini `generateContent` REST endpoint.
//!
//! The gateways only need "prompt plus inline media in, text out", so the
//! client is hidden behind [`GenerativeModel`] and tests substitute a fake.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::GenerativeAiConfig;

/// One base64 media attachment sent alongside the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime_type: String,
    pub data: String,
}

/// A single-turn generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub media: Vec<InlineMedia>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The upstream rejected our API key
    #[error("Generative model rejected the API key: {0}")]
    InvalidCredential(String),

    #[error("Generative model returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Generative model request failed: {0}")]
    Transport(String),

    #[error("Failed to decode generative model response: {0}")]
    Decode(String),
}

/// Text generation backed by an external model
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run one generation. `Ok(None)` means the call succeeded but produced
    /// no candidate text.
    async fn generate(&self, request: GenerationRequest) -> Result<Option<String>, ModelError>;
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any
    fn first_candidate_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Whether an upstream failure means the API key itself is bad
pub(crate) fn is_invalid_credential(status: StatusCode, body: &str) -> bool {
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("API_KEY_INVALID")
        || body.contains("API key not valid")
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &GenerativeAiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let model = config.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };

        Ok(Self {
            http,
            api_key,
            endpoint: format!(
                "{}/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                model_path
            ),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<Option<String>, ModelError> {
        let mut parts = Vec::with_capacity(request.media.len() + 1);
        parts.push(Part::Text {
            text: &request.prompt,
        });
        parts.extend(request.media.iter().map(|m| Part::InlineData {
            inline_data: InlineData {
                mime_type: &m.mime_type,
                data: &m.data,
            },
        }));

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_invalid_credential(status, &body) {
                return Err(ModelError::InvalidCredential(
                    body.chars().take(200).collect(),
                ));
            }
            return Err(ModelError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        Ok(payload.first_candidate_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: "classify" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "iVBOR",
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 512,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "classify");
        assert_eq!(
            json["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn test_first_candidate_text_joins_parts() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.first_candidate_text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_missing_candidates_is_none() {
        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.first_candidate_text().is_none());

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(blocked.first_candidate_text().is_none());

        let blank: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(blank.first_candidate_text().is_none());
    }

    #[test]
    fn test_invalid_credential_detection() {
        let gemini_body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert!(is_invalid_credential(StatusCode::BAD_REQUEST, gemini_body));
        assert!(is_invalid_credential(StatusCode::FORBIDDEN, ""));
        assert!(is_invalid_credential(StatusCode::UNAUTHORIZED, ""));
        assert!(!is_invalid_credential(
            StatusCode::TOO_MANY_REQUESTS,
            "Resource has been exhausted"
        ));
        assert!(!is_invalid_credential(StatusCode::INTERNAL_SERVER_ERROR, ""));
    }
}
