//! Generative model collaborator
//!
//! The engine hands the assembled prompt to an opaque external model. No
//! internal retries: a failure surfaces as `GenerationUnavailable` so the
//! caller can retry, degrade, or report — never a fabricated answer.

use crate::error::{RaglineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Base URL for the Gemini generateContent REST API
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Abstract generative model: prompt body in, response text out
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini REST client
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiModel {
    /// Create a client for the given model (e.g. "gemini-2.0-flash")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f32) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RaglineError::Config(
                "Gemini API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            temperature,
        })
    }

    /// Create a client reading the API key from the named environment variable
    pub fn from_env(api_key_env: &str, model: impl Into<String>, temperature: f32) -> Result<Self> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            RaglineError::Config(format!("{} environment variable not set", api_key_env))
        })?;
        Self::new(api_key, model, temperature)
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        tracing::debug!("Calling Gemini model {} ({} prompt bytes)", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RaglineError::GenerationUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error {}: {}", status, body);
            return Err(RaglineError::GenerationUnavailable(format!(
                "API returned {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RaglineError::GenerationUnavailable(format!("invalid response: {e}")))?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.is_empty() {
            // An empty completion is a failure, not an answer
            return Err(RaglineError::GenerationUnavailable(
                "model returned no candidates".to_string(),
            ));
        }

        Ok(text)
    }
}
