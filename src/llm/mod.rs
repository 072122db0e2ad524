//! LLM module - Gemini text generation with retry
//!
//! The agents only see the [`LlmClient`] trait; [`GeminiClient`] is the
//! production implementation.
//!
//! ## Usage
//! ```rust,ignore
//! let llm = GeminiClient::from_settings(&settings)?;
//! let answer = llm.generate("What does Article 21 protect?").await?;
//! ```

mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_BASE_URL, RETRYABLE_STATUSES};

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by an [`LlmClient`]
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key in the environment
    #[error("Gemini API key not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    /// HTTP client could not be built or the request could not be constructed
    #[error("failed to build Gemini request: {0}")]
    Request(#[source] reqwest::Error),

    /// Non-retryable HTTP status
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Every attempt failed with a retryable error
    #[error(
        "Gemini request failed after {attempts} attempts (last status: {}): {last_body}",
        status_label(.last_status)
    )]
    RetriesExhausted {
        attempts: u32,
        last_status: Option<u16>,
        last_body: String,
    },
}

fn status_label(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

// ============================================================================
// LlmClient Trait
// ============================================================================

/// Text generation interface used by the agents and the OCR fallback
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for a text prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Generate a completion for a prompt about an inline document (PDF, image)
    async fn generate_with_document(
        &self,
        prompt: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<String, LlmError>;

    /// Model identifier
    fn model(&self) -> &str;
}
