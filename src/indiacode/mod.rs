//! IndiaCode statute corpus
//!
//! The corpus is a JSON export of IndiaCode shaped as
//! `{ "<category>": { "<title>": { "metadata": {...}, "pdfLinks": [...] } } }`
//! where categories are `allacts`, `allregulations`, `allrules`, ...
//!
//! Each Act is stored twice: as a row in the `acts` table (for citation
//! matching) and as a text block indexed into the `indiacode` vector table.

mod fetch;
mod matcher;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::knowledge::{KnowledgeBase, NewDocument, Source};

pub use fetch::{fetch_and_index, resolve_pdf_link, ActPdfFetcher, INDIACODE_BASE_URL};
pub use matcher::{
    citations_markdown, extract_act_names, normalize_act_name, ActCatalog, ActCitation, ActMatch,
};

// ============================================================================
// ActRecord
// ============================================================================

/// One IndiaCode entry; empty strings mean "not given"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActRecord {
    pub category: String,
    pub title: String,
    pub short_title: String,
    pub act_id: String,
    pub act_number: String,
    pub act_year: String,
    pub long_title: String,
    pub enactment_date: String,
    pub enforcement_date: String,
    pub pdf_links: Vec<String>,
}

impl ActRecord {
    /// Stable document key
    pub fn url(&self) -> String {
        format!("indiacode://{}/{}", self.category, self.title)
    }

    /// Text indexed for retrieval
    pub fn to_text_block(&self) -> String {
        let mut lines = vec![
            format!("Source: IndiaCode ({})", self.category),
            format!("Title: {}", self.title),
        ];

        let optional = [
            ("Short Title", &self.short_title),
            ("Act ID", &self.act_id),
            ("Act Number", &self.act_number),
            ("Act Year", &self.act_year),
            ("Enactment Date", &self.enactment_date),
            ("Enforcement Date", &self.enforcement_date),
            ("Long Title", &self.long_title),
        ];
        for (label, value) in optional {
            if !value.is_empty() {
                lines.push(format!("{}: {}", label, value));
            }
        }

        let links: Vec<&String> = self.pdf_links.iter().filter(|l| !l.trim().is_empty()).collect();
        if !links.is_empty() {
            lines.push("PDF Links:".to_string());
            lines.extend(links.into_iter().cloned());
        }

        lines.join("\n")
    }

    fn to_document(&self) -> NewDocument {
        NewDocument {
            source: Source::IndiaCode,
            url: self.url(),
            title: Some(self.title.clone()),
            content: self.to_text_block(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// First present metadata key, trimmed
fn metadata_field(metadata: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| metadata.get(*k))
        .map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// Parse the IndiaCode JSON export
pub fn parse_indiacode_json(raw: &str) -> Result<Vec<ActRecord>> {
    let data: Value = serde_json::from_str(raw).context("Invalid IndiaCode JSON")?;
    let categories = data
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("IndiaCode JSON must be an object of categories"))?;

    let empty = serde_json::Map::new();
    let mut acts = Vec::new();

    for (category, entries) in categories {
        let Some(entries) = entries.as_object() else {
            tracing::debug!("Skipping non-object category '{}'", category);
            continue;
        };

        for (title, details) in entries {
            let metadata = details
                .get("metadata")
                .and_then(Value::as_object)
                .unwrap_or(&empty);

            let pdf_links = details
                .get("pdfLinks")
                .and_then(Value::as_array)
                .map(|links| {
                    links
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            acts.push(ActRecord {
                category: category.clone(),
                title: title.trim().to_string(),
                short_title: metadata_field(metadata, &["Act Short Title:", "Short Title"]),
                act_id: metadata_field(metadata, &["Act ID:", "ActID"]),
                act_number: metadata_field(metadata, &["Act Number:"]),
                act_year: metadata_field(metadata, &["Act Year:"]),
                long_title: metadata_field(metadata, &["Long Title:"]),
                enactment_date: metadata_field(metadata, &["Enactment Date:"]),
                enforcement_date: metadata_field(metadata, &["Enforcement Date:"]),
                pdf_links,
            });
        }
    }

    Ok(acts)
}

/// Load the IndiaCode JSON export from disk
pub fn load_indiacode_json(path: &Path) -> Result<Vec<ActRecord>> {
    if !path.exists() {
        anyhow::bail!("IndiaCode JSON not found at: {}", path.display());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_indiacode_json(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

// ============================================================================
// Index Build
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusReport {
    pub acts: usize,
    pub indexed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub pruned: usize,
}

/// Load the corpus, store the Act table, and index every Act
///
/// Acts that disappeared from the corpus since the last build are removed.
pub async fn build_indiacode_index(kb: &KnowledgeBase, path: &Path) -> Result<CorpusReport> {
    let acts = load_indiacode_json(path)?;
    if acts.is_empty() {
        anyhow::bail!("No IndiaCode docs found in {}", path.display());
    }

    kb.store().replace_acts(&acts)?;

    let mut report = CorpusReport {
        acts: acts.len(),
        ..Default::default()
    };
    let mut keep = HashSet::with_capacity(acts.len());

    for (i, act) in acts.iter().enumerate() {
        keep.insert(act.url());
        match kb.index_document(act.to_document(), false).await {
            Ok(r) if r.skipped => report.unchanged += 1,
            Ok(_) => report.indexed += 1,
            Err(e) => {
                tracing::warn!("Failed to index '{}': {:#}", act.title, e);
                report.failed += 1;
            }
        }

        if (i + 1) % 100 == 0 {
            tracing::info!("IndiaCode progress: {}/{}", i + 1, acts.len());
        }
    }

    report.pruned = kb.prune_source(Source::IndiaCode, &keep).await?;

    tracing::info!(
        "IndiaCode index built: {} acts ({} indexed, {} unchanged, {} failed)",
        report.acts,
        report.indexed,
        report.unchanged,
        report.failed
    );
    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================
