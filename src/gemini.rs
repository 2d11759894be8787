//! Google Gemini client for multimodal image analysis.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::preprocess::EncodedImage;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("No API key configured (set GOOGLE_API_KEY)")]
    MissingApiKey,

    #[error("Request to Gemini failed: {0}")]
    Transport(reqwest::Error),

    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed Gemini response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("No text in Gemini response")]
    EmptyResponse,
}

/// A remote service that answers a prompt about one image.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Send `prompt` and a single image, returning the generated text.
    async fn query(&self, prompt: &str, image: &EncodedImage) -> Result<String, InferenceError>;

    fn model_name(&self) -> &str;
}

// --- generateContent request/response ---

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, InferenceError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(InferenceError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(InferenceError::EmptyResponse)?;

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
        if texts.is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some("SAFETY") => Err(InferenceError::Blocked("SAFETY".to_string())),
                _ => Err(InferenceError::EmptyResponse),
            };
        }

        Ok(texts.concat())
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_base: &str, model: &str, api_key: Option<String>) -> Self {
        let api_base = api_base.trim_end_matches('/').to_string();
        info!("Gemini client configured: base={}, model={}", api_base, model);
        if api_key.is_none() {
            warn!("No Gemini API key configured; analysis requests will fail");
        }

        Self {
            client: Client::new(),
            api_base,
            model: model.to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base, &config.model, config.api_key.clone())
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, api_key
        )
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn query(&self, prompt: &str, image: &EncodedImage) -> Result<String, InferenceError> {
        let api_key = self.api_key.as_deref().ok_or(InferenceError::MissingApiKey)?;

        let payload = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text { text: prompt },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: image.mime_type,
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
        };

        debug!(
            "📤 Sending request to Gemini ({} bytes of {})",
            image.bytes.len(),
            image.mime_type
        );

        let response = self
            .client
            .post(self.endpoint(api_key))
            .json(&payload)
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        let response_text = response.text().await.map_err(redact)?;

        debug!(
            "Gemini responded {}: {}",
            status,
            &response_text[..floor_char_boundary(&response_text, 500)]
        );

        if !status.is_success() {
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&response_text)?;
        parsed.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// The request URL carries the API key.
fn redact(err: reqwest::Error) -> InferenceError {
    InferenceError::Transport(err.without_url())
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
