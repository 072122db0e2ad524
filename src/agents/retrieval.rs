//! Multi-source retrieval
//!
//! The query is embedded once and searched in every source table. Each hit's
//! similarity is scaled by its source weight, then all hits are merged into
//! one ranked list.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;
use crate::knowledge::{Source, VectorStore};

/// Separator between passages in the context handed to the LLM
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPassage {
    pub source: Source,
    pub doc_id: i64,
    pub chunk_index: i32,
    pub text: String,
    /// Raw vector similarity
    pub similarity: f32,
    /// `similarity * source weight`, used for ranking
    pub score: f32,
}

struct SourceIndex {
    source: Source,
    store: Arc<dyn VectorStore>,
    weight: f32,
}

pub struct RetrievalAgent {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    indexes: Vec<SourceIndex>,
}

impl RetrievalAgent {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            embedder,
            top_k,
            indexes: Vec::new(),
        }
    }

    /// Add a source table; earlier sources win score ties
    pub fn with_index(mut self, source: Source, store: Arc<dyn VectorStore>, weight: f32) -> Self {
        self.indexes.push(SourceIndex {
            source,
            store,
            weight,
        });
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn sources(&self) -> Vec<Source> {
        self.indexes.iter().map(|i| i.source).collect()
    }

    /// Ranked, deduplicated passages from every source
    ///
    /// A source whose search fails is logged and left out.
    pub async fn retrieve_passages(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        if query.trim().is_empty() || self.indexes.is_empty() || self.top_k == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self
            .embedder
            .embed_query(query)
            .await
            .context("Failed to embed query")?;

        let mut passages = Vec::new();
        for index in &self.indexes {
            let hits = match index.store.search(&query_embedding, self.top_k).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!("Search in '{}' failed: {:#}", index.source, e);
                    continue;
                }
            };
            tracing::debug!("{} hits from '{}'", hits.len(), index.source);

            passages.extend(
                hits.into_iter()
                    .filter(|h| !h.chunk_text.trim().is_empty())
                    .map(|h| RetrievedPassage {
                        source: index.source,
                        doc_id: h.doc_id,
                        chunk_index: h.chunk_index,
                        score: h.similarity * index.weight,
                        similarity: h.similarity,
                        text: h.chunk_text,
                    }),
            );
        }

        // stable: equal scores keep source order
        passages.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut seen = HashSet::new();
        passages.retain(|p| seen.insert(p.text.trim().to_string()));

        Ok(passages)
    }

    /// Passages joined into one context string; empty when nothing matched
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        let passages = self.retrieve_passages(query).await?;
        Ok(join_passages(&passages))
    }
}

pub fn join_passages(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

// ============================================================================
// Tests
// ============================================================================
