//! AI text service — the single point of entry for all Gemini calls.
//!
//! Modeled as an injected capability so call sites stay testable with a
//! deterministic fake, and so the "optional enrichment vs required
//! result" policy lives at the call site: tag generation degrades to an
//! empty list, the match endpoint propagates failures to the client.
//!
//! BYOK: the API key arrives per request, never from server config.

pub mod matching;
pub mod prompts;
pub mod tags;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::ai::matching::{AvailableSections, MatchResult, PinnedSection};
use crate::models::block::Category;

const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid API key: {0}")]
    Auth(String),

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI returned empty content")]
    EmptyContent,
}

/// One method per use so each call site carries its own failure policy.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Lowercase tags/keywords for one block payload.
    async fn extract_tags(
        &self,
        api_key: &str,
        payload: &Value,
        category: Category,
    ) -> Result<Vec<String>, AiError>;

    /// Technical terms from free text (a job description).
    async fn extract_terms(&self, api_key: &str, text: &str) -> Result<Vec<String>, AiError>;

    /// Matches available blocks against job description terms.
    async fn match_sections(
        &self,
        api_key: &str,
        terms: &[String],
        available: &AvailableSections,
        pinned: &[PinnedSection],
    ) -> Result<MatchResult, AiError>;

    /// Raw text generation for one prompt.
    async fn generate_text(&self, api_key: &str, prompt: &str) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

/// Gemini-backed implementation used in production.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, AiError> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(GEMINI_API_URL)
            .query(&[("key", api_key)])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 | 401 | 403 => AiError::Auth(message),
                429 => AiError::RateLimited(message),
                code => AiError::Api {
                    status: code,
                    message,
                },
            });
        }

        let body: GeminiResponse = response.json().await?;
        let text = body.text().ok_or(AiError::EmptyContent)?;
        debug!("AI call succeeded ({} chars)", text.len());
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl AiService for GeminiClient {
    async fn extract_tags(
        &self,
        api_key: &str,
        payload: &Value,
        category: Category,
    ) -> Result<Vec<String>, AiError> {
        let prompt = prompts::tags_prompt(&tags::payload_to_text(payload), category);
        let text = self.generate(api_key, &prompt).await?;
        Ok(tags::parse_tag_array(&text))
    }

    async fn extract_terms(&self, api_key: &str, text: &str) -> Result<Vec<String>, AiError> {
        let prompt = prompts::terms_prompt(text);
        let response = self.generate(api_key, &prompt).await?;
        Ok(tags::parse_tag_array(&response))
    }

    async fn match_sections(
        &self,
        api_key: &str,
        terms: &[String],
        available: &AvailableSections,
        pinned: &[PinnedSection],
    ) -> Result<MatchResult, AiError> {
        let prompt = prompts::match_prompt(terms, available, pinned);
        let response = self.generate(api_key, &prompt).await?;
        Ok(matching::parse_match_response(&response))
    }

    async fn generate_text(&self, api_key: &str, prompt: &str) -> Result<String, AiError> {
        self.generate(api_key, prompt).await
    }
}
