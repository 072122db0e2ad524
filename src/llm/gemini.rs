//! Gemini `generateContent` client with exponential backoff
//!
//! ref: https://ai.google.dev/api/generate-content

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{LlmClient, LlmError};
use crate::config::Settings;

/// Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP statuses treated as transient (rate limit / server overload)
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Backoff unit: wait = unit * 2^attempt + jitter(0..unit)
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// Configuration
// ============================================================================

/// Gemini client settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    /// Total attempts per request
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: 2048,
            timeout: Duration::from_secs(30),
            max_retries: 6,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl From<&Settings> for GeminiConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens,
            timeout: Duration::from_secs(settings.request_timeout_secs),
            max_retries: settings.max_retries.max(1),
            ..Default::default()
        }
    }
}

// ============================================================================
// GeminiClient
// ============================================================================

/// Gemini text generation client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(api_key: String, config: GeminiConfig) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Request)?;

        Ok(Self {
            api_key,
            client,
            config,
        })
    }

    /// Build from settings, reading the API key from the environment
    pub fn from_settings(settings: &Settings) -> Result<Self, LlmError> {
        let api_key = crate::config::get_api_key().map_err(|_| LlmError::MissingApiKey)?;
        Self::new(api_key, GeminiConfig::from(settings))
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request(&self, parts: Vec<Part>) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    /// Delay before the next attempt
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay;
        let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = base.mul_f64(rand::thread_rng().gen::<f64>());
        exponential + jitter
    }

    /// Sleep before retrying unless this was the final attempt
    async fn wait_before_retry(&self, attempt: u32) {
        if attempt + 1 < self.config.max_retries {
            tokio::time::sleep(self.backoff(attempt)).await;
        }
    }

    /// Send a request, retrying transient failures
    ///
    /// - 429/500/502/503/504, connection errors, timeouts, and 2xx bodies
    ///   without candidate text are retried with exponential backoff
    /// - any other non-2xx status fails immediately
    async fn send_with_retry(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        let url = self.endpoint();
        let attempts = self.config.max_retries.max(1);
        let mut last_status: Option<u16> = None;
        let mut last_body = String::new();

        for attempt in 0..attempts {
            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) if e.is_builder() => return Err(LlmError::Request(e)),
                Err(e) => {
                    tracing::warn!(
                        "[Gemini] Network error, retry {}/{}: {}",
                        attempt + 1,
                        attempts,
                        e
                    );
                    last_status = None;
                    last_body = e.to_string();
                    self.wait_before_retry(attempt).await;
                    continue;
                }
            };

            let status = response.status().as_u16();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        "[Gemini] Failed to read body, retry {}/{}: {}",
                        attempt + 1,
                        attempts,
                        e
                    );
                    last_status = Some(status);
                    last_body = e.to_string();
                    self.wait_before_retry(attempt).await;
                    continue;
                }
            };

            if RETRYABLE_STATUSES.contains(&status) {
                tracing::warn!(
                    "[Gemini] Retry {}/{} (HTTP {})",
                    attempt + 1,
                    attempts,
                    status
                );
                last_status = Some(status);
                last_body = body;
                self.wait_before_retry(attempt).await;
                continue;
            }

            if !(200..300).contains(&status) {
                return Err(LlmError::Api { status, body });
            }

            match parse_candidate_text(&body) {
                Ok(text) => {
                    tracing::debug!(
                        "[Gemini] {} chars generated on attempt {}",
                        text.len(),
                        attempt + 1
                    );
                    return Ok(text);
                }
                Err(reason) => {
                    tracing::warn!(
                        "[Gemini] Parse error, retry {}/{}: {}",
                        attempt + 1,
                        attempts,
                        reason
                    );
                    last_status = Some(status);
                    last_body = body;
                    self.wait_before_retry(attempt).await;
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts,
            last_status,
            last_body,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = self.request(vec![Part::Text {
            text: prompt.to_string(),
        }]);
        self.send_with_retry(&request).await
    }

    async fn generate_with_document(
        &self,
        prompt: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<String, LlmError> {
        let request = self.request(vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: STANDARD.encode(data),
                },
            },
            Part::Text {
                text: prompt.to_string(),
            },
        ]);
        self.send_with_retry(&request).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Concatenated text of the first candidate
fn parse_candidate_text(body: &str) -> Result<String, String> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| "response has no candidates".to_string())?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(format!(
            "candidate has no text (finishReason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ));
    }

    Ok(text)
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
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
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
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

// ============================================================================
// Tests
// ============================================================================
