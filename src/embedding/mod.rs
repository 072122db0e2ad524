//! Embedding module - text vectorisation through the Gemini API
//!
//! Passages (Act metadata, judgment summaries, uploaded documents) and
//! questions are embedded with `gemini-embedding-001`. Passages use the
//! `RETRIEVAL_DOCUMENT` task type and questions `RETRIEVAL_QUERY`.
//!
//! Passages are sent through `batchEmbedContents` in groups of
//! [`BATCH_SIZE`], so indexing a few thousand Acts stays well under the
//! free-tier request budget.
//!
//! ## Usage
//! ```rust,ignore
//! let embedder = GeminiEmbedding::from_env()?;
//! let embedding = embedder.embed_query("What is the punishment for cheating?").await?;
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::get_api_key;
use crate::llm::DEFAULT_BASE_URL;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// Embedding provider interface
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a passage for storage
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a search query (defaults to passage embedding)
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text).await
    }

    /// Embed many passages (sequential by default)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Embedding dimension
    fn dimension(&self) -> usize;

    /// Provider name
    fn name(&self) -> &str;
}

// ============================================================================
// Google Gemini Embedding
// ============================================================================

/// ref: https://ai.google.dev/gemini-api/docs/embeddings
pub const EMBEDDING_MODEL: &str = "gemini-embedding-001";

pub const DEFAULT_DIMENSION: usize = 768;

/// Texts per `batchEmbedContents` call (API maximum)
pub const BATCH_SIZE: usize = 100;

/// Free tier: 60 requests per minute, at most one per second
const REQUESTS_PER_WINDOW: usize = 60;
const RATE_WINDOW: Duration = Duration::from_secs(60);
const MIN_REQUEST_GAP: Duration = Duration::from_secs(1);

const MAX_ATTEMPTS: u32 = 4;
const BACKOFF_UNIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskType {
    Document,
    Query,
}

impl TaskType {
    fn as_str(self) -> &'static str {
        match self {
            TaskType::Document => "RETRIEVAL_DOCUMENT",
            TaskType::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Request pacing: a minimum gap between calls plus a sliding-window cap
#[derive(Debug)]
struct RequestPacer {
    sent: VecDeque<Instant>,
    max_in_window: usize,
    window: Duration,
    min_gap: Duration,
}

impl RequestPacer {
    fn new(max_in_window: usize, window: Duration, min_gap: Duration) -> Self {
        Self {
            sent: VecDeque::new(),
            max_in_window,
            window,
            min_gap,
        }
    }

    /// Sleep until another request may be sent, then record it
    async fn wait_turn(&mut self) {
        if let Some(last) = self.sent.back() {
            let since = last.elapsed();
            if since < self.min_gap {
                tokio::time::sleep(self.min_gap - since).await;
            }
        }

        self.expire(Instant::now());
        if self.sent.len() >= self.max_in_window {
            if let Some(oldest) = self.sent.front() {
                let wait = self.window.saturating_sub(oldest.elapsed());
                if !wait.is_zero() {
                    tracing::debug!("Embedding rate limit reached, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
            self.expire(Instant::now());
        }

        self.sent.push_back(Instant::now());
    }

    fn expire(&mut self, now: Instant) {
        while let Some(oldest) = self.sent.front() {
            if now.duration_since(*oldest) < self.window {
                break;
            }
            self.sent.pop_front();
        }
    }
}

/// Google Gemini embedding provider
#[derive(Debug)]
pub struct GeminiEmbedding {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    dimension: usize,
    backoff_unit: Duration,
    pacer: Mutex<RequestPacer>,
}

impl GeminiEmbedding {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_dimension(api_key, DEFAULT_DIMENSION)
    }

    /// Create with an explicit dimension (768, 1536 or 3072)
    pub fn with_dimension(api_key: String, dimension: usize) -> Result<Self> {
        if ![768, 1536, 3072].contains(&dimension) {
            anyhow::bail!(
                "Invalid dimension: {}. Must be 768, 1536, or 3072",
                dimension
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            dimension,
            backoff_unit: BACKOFF_UNIT,
            pacer: Mutex::new(RequestPacer::new(
                REQUESTS_PER_WINDOW,
                RATE_WINDOW,
                MIN_REQUEST_GAP,
            )),
        })
    }

    /// Create from `GEMINI_API_KEY` / `GOOGLE_AI_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::new(get_api_key()?)
    }

    /// Point at another API host without pacing or backoff delays
    #[cfg(test)]
    fn unpaced(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self.backoff_unit = Duration::ZERO;
        self.pacer = Mutex::new(RequestPacer::new(usize::MAX, RATE_WINDOW, Duration::ZERO));
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn request_for(&self, text: &str, task: TaskType) -> EmbedRequest {
        EmbedRequest {
            model: format!("models/{}", EMBEDDING_MODEL),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
            task_type: task.as_str(),
            output_dimensionality: self.dimension,
        }
    }

    /// POST `models/gemini-embedding-001:{method}`
    ///
    /// 429, 5xx and transport errors are retried with exponential backoff;
    /// other error statuses fail at once.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let url = format!(
            "{}/v1beta/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            EMBEDDING_MODEL,
            method
        );
        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = self.backoff_unit * 2u32.pow(attempt - 1);
                tracing::warn!(
                    "Embedding retry {}/{} in {:?}: {}",
                    attempt,
                    MAX_ATTEMPTS - 1,
                    backoff,
                    last_error
                );
                tokio::time::sleep(backoff).await;
            }

            self.pacer.lock().await.wait_turn().await;

            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = format!("request failed: {}", e);
                    continue;
                }
            };

            let status = response.status();
            let text = response
                .text()
                .await
                .context("Failed to read embedding response")?;

            if status.is_success() {
                return serde_json::from_str(&text).context("Failed to parse embedding response");
            }

            if status.as_u16() == 429 || status.is_server_error() {
                last_error = format!("HTTP {}", status.as_u16());
                continue;
            }

            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            anyhow::bail!("Gemini embedding error ({}): {}", status.as_u16(), message);
        }

        anyhow::bail!(
            "Embedding failed after {} attempts: {}",
            MAX_ATTEMPTS,
            last_error
        )
    }

    fn check_dimension(&self, values: &[f32]) -> Result<()> {
        if values.len() != self.dimension {
            anyhow::bail!(
                "Embedding has {} dimensions, expected {}",
                values.len(),
                self.dimension
            );
        }
        Ok(())
    }

    async fn embed_one(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let response: EmbedResponse = self
            .call("embedContent", &self.request_for(text, task))
            .await?;
        self.check_dimension(&response.embedding.values)?;
        Ok(response.embedding.values)
    }

    /// One `batchEmbedContents` call; blank texts get zero vectors locally
    async fn embed_group(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let requests: Vec<EmbedRequest> = texts
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| self.request_for(t, TaskType::Document))
            .collect();

        let mut embedded = if requests.is_empty() {
            Vec::new().into_iter()
        } else {
            let response: BatchEmbedResponse = self
                .call("batchEmbedContents", &BatchEmbedRequest { requests: &requests })
                .await?;
            if response.embeddings.len() != requests.len() {
                anyhow::bail!(
                    "Batch returned {} embeddings for {} texts",
                    response.embeddings.len(),
                    requests.len()
                );
            }
            response.embeddings.into_iter()
        };

        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                out.push(vec![0.0; self.dimension]);
            } else if let Some(values) = embedded.next() {
                self.check_dimension(&values.values)?;
                out.push(values.values);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "outputDimensionality")]
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: &'a [EmbedRequest],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text, TaskType::Document).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text, TaskType::Query).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for (i, group) in texts.chunks(BATCH_SIZE).enumerate() {
            tracing::debug!(
                "Embedding batch {}/{} ({} texts)",
                i + 1,
                texts.len().div_ceil(BATCH_SIZE),
                group.len()
            );
            results.extend(self.embed_group(group).await?);
        }
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        EMBEDDING_MODEL
    }
}

// ============================================================================
// Factory Function
// ============================================================================

/// Create the Gemini embedder from the environment
pub fn create_embedder() -> Result<GeminiEmbedding> {
    let api_key = get_api_key().context(
        "GEMINI_API_KEY or GOOGLE_AI_API_KEY not set.\n\
         Set: export GEMINI_API_KEY=your-api-key",
    )?;

    let embedder = GeminiEmbedding::new(api_key)?;
    tracing::debug!(
        "Using {} embeddings (dimension: {})",
        EMBEDDING_MODEL,
        embedder.dimension()
    );
    Ok(embedder)
}

// ============================================================================
// Tests
// ============================================================================
