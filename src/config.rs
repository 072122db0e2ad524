//! Configuration - data directory, API key, and `config.toml` settings
//!
//! Resolution order for the data directory:
//! 1. `--data-dir` flag
//! 2. `NYAYA_RAG_HOME` environment variable
//! 3. `<local data dir>/.nyaya-rag`
//!
//! `config.toml` inside the data directory is optional. Every field has a default,
//! so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "NYAYA_RAG_HOME";

/// Settings file name inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

// ============================================================================
// Data Directory
// ============================================================================

/// Default data directory (~/.nyaya-rag/)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nyaya-rag")
}

/// Resolve the data directory from an optional CLI flag
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }

    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => default_data_dir(),
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Per-source weights applied to vector similarity before merging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceWeights {
    pub documents: f32,
    pub indiacode: f32,
    pub judgments: f32,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            documents: 1.0,
            indiacode: 0.85,
            judgments: 0.75,
        }
    }
}

/// Runtime settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Gemini generation model
    pub model: String,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
    /// Attempts per Gemini request (including the first)
    pub max_retries: u32,
    /// Passages retrieved per source
    pub top_k: usize,
    pub weights: SourceWeights,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Context is cut to this many chars before summarizing
    pub summary_max_chars: usize,
    /// Minimum similarity for an Act name to match an IndiaCode title
    pub act_match_threshold: f64,
    pub judgment_start_year: i32,
    pub judgment_end_year: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: 2048,
            request_timeout_secs: 30,
            max_retries: 6,
            top_k: 6,
            weights: SourceWeights::default(),
            chunk_size: 1000,
            chunk_overlap: 200,
            summary_max_chars: 4000,
            act_match_threshold: 0.75,
            judgment_start_year: 2000,
            judgment_end_year: 2025,
        }
    }
}

impl Settings {
    /// Load `config.toml` from the data directory, falling back to defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE, data_dir);
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        let settings = Self::from_toml(&raw)
            .with_context(|| format!("Invalid settings file: {:?}", path))?;

        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }
        if self.chunk_overlap >= self.chunk_size {
            anyhow::bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.max_retries == 0 {
            anyhow::bail!("max_retries must be at least 1");
        }
        if self.judgment_start_year > self.judgment_end_year {
            anyhow::bail!(
                "judgment_start_year ({}) is after judgment_end_year ({})",
                self.judgment_start_year,
                self.judgment_end_year
            );
        }
        Ok(())
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// Load the Gemini API key from the environment
///
/// Priority:
/// 1. `GEMINI_API_KEY`
/// 2. `GOOGLE_AI_API_KEY`
pub fn get_api_key() -> Result<String> {
    for var in ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                tracing::debug!("Using API key from {}", var);
                return Ok(key);
            }
        }
    }

    anyhow::bail!(
        "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
         Get your API key at: https://aistudio.google.com/app/apikey"
    )
}

/// Whether an API key is configured
pub fn has_api_key() -> bool {
    get_api_key().is_ok()
}

// ============================================================================
// Tests
// ============================================================================
