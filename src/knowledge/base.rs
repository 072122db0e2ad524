//! KnowledgeBase - SQLite documents + one LanceDB table per source
//!
//! Indexing a document means: upsert the text into SQLite, then replace the
//! document's chunk vectors in the table for its source.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::agents::RetrievalAgent;
use crate::config::{Settings, SourceWeights};
use crate::embedding::{create_embedder, EmbeddingProvider};

use super::chunker::{character_chunker, ChunkConfig, Chunker};
use super::lance::LanceVectorStore;
use super::store::{
    Document, FtsSearchResult, KnowledgeStore, NewDocument, Source, StoreStats, UpsertOutcome,
};
use super::vector::{VectorEntry, VectorStore};

// ============================================================================
// Types
// ============================================================================

/// Result of indexing one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub doc_id: i64,
    pub source: Source,
    /// Chunks embedded on this call (0 when skipped)
    pub chunks: usize,
    /// Content unchanged and already embedded
    pub skipped: bool,
    pub outcome: UpsertOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStats {
    pub store: StoreStats,
    pub vectors_by_source: Vec<(Source, usize)>,
    pub embedder: Option<String>,
}

// ============================================================================
// KnowledgeBase
// ============================================================================

pub struct KnowledgeBase {
    store: KnowledgeStore,
    indexes: HashMap<Source, Arc<dyn VectorStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Box<dyn Chunker>,
}

impl KnowledgeBase {
    /// Open the stores under `data_dir`
    ///
    /// The embedder is only created when an API key is configured, so
    /// listing, keyword search and deletion work offline.
    pub async fn open(data_dir: &Path, settings: &Settings) -> Result<Self> {
        if !data_dir.exists() {
            std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;
        }

        let store = KnowledgeStore::open_in(data_dir).context("Failed to open knowledge store")?;

        let lance_path = data_dir.join("vectors.lance");
        let mut indexes: HashMap<Source, Arc<dyn VectorStore>> = HashMap::new();
        for source in Source::ALL {
            let table = LanceVectorStore::open(&lance_path, source.as_str())
                .await
                .with_context(|| format!("Failed to open vector table '{}'", source))?;
            indexes.insert(source, Arc::new(table));
        }

        let embedder: Option<Arc<dyn EmbeddingProvider>> = match create_embedder() {
            Ok(e) => Some(Arc::new(e)),
            Err(e) => {
                tracing::debug!("Embedder unavailable: {}", e);
                None
            }
        };

        let chunker = character_chunker(ChunkConfig::new(settings.chunk_size, settings.chunk_overlap));

        Ok(Self::from_parts(store, indexes, embedder, chunker))
    }

    /// Assemble from already-built components
    pub fn from_parts(
        store: KnowledgeStore,
        indexes: HashMap<Source, Arc<dyn VectorStore>>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        chunker: Box<dyn Chunker>,
    ) -> Self {
        Self {
            store,
            indexes,
            embedder,
            chunker,
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn index(&self, source: Source) -> Option<Arc<dyn VectorStore>> {
        self.indexes.get(&source).cloned()
    }

    fn index_for(&self, source: Source) -> Result<&Arc<dyn VectorStore>> {
        self.indexes
            .get(&source)
            .ok_or_else(|| anyhow::anyhow!("No vector index for source '{}'", source))
    }

    /// The embedder, or an error telling the user to set the API key
    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        self.embedder.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "GEMINI_API_KEY or GOOGLE_AI_API_KEY not set.\n\
                 Set: export GEMINI_API_KEY=your-api-key"
            )
        })
    }

    // ------------------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------------------

    /// Store a document and (re)build its vectors
    ///
    /// Unchanged content that already has vectors is skipped unless `force`.
    pub async fn index_document(&self, doc: NewDocument, force: bool) -> Result<IndexReport> {
        let embedder = self.embedder()?;
        let index = self.index_for(doc.source)?;

        let outcome = self
            .store
            .upsert_document(&doc)
            .with_context(|| format!("Failed to store document {}", doc.url))?;
        let doc_id = outcome.id();

        if matches!(outcome, UpsertOutcome::Unchanged(_))
            && !force
            && index.has_embeddings(doc_id).await?
        {
            tracing::debug!("Unchanged, skipping: {}", doc.url);
            return Ok(IndexReport {
                doc_id,
                source: doc.source,
                chunks: 0,
                skipped: true,
                outcome,
            });
        }

        index.delete_by_doc_id(doc_id).await?;

        let chunks = self.chunker.chunk(&doc.content);
        if chunks.is_empty() {
            tracing::warn!("No chunks generated for document: {}", doc.url);
            return Ok(IndexReport {
                doc_id,
                source: doc.source,
                chunks: 0,
                skipped: false,
                outcome,
            });
        }

        let embeddings = embedder
            .embed_batch(&chunks)
            .await
            .with_context(|| format!("Failed to embed {}", doc.url))?;

        let entries: Vec<VectorEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk_text, embedding))| VectorEntry {
                doc_id,
                chunk_index: i as i32,
                chunk_text,
                embedding,
            })
            .collect();

        let inserted = index.insert_batch(&entries).await?;
        tracing::debug!(
            "Indexed {} ({} chunks) into '{}'",
            doc.url,
            inserted,
            index.name()
        );

        Ok(IndexReport {
            doc_id,
            source: doc.source,
            chunks: inserted,
            skipped: false,
            outcome,
        })
    }

    /// Remove documents of `source` whose URL is not in `keep`
    pub async fn prune_source(&self, source: Source, keep: &HashSet<String>) -> Result<usize> {
        let mut removed = 0;
        for id in self.store.document_ids(source)? {
            let Some(doc) = self.store.get_document(id)? else {
                continue;
            };
            if !keep.contains(&doc.url) && self.delete_document(id).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!("Pruned {} stale '{}' documents", removed, source);
        }
        Ok(removed)
    }

    /// Delete a document and its vectors
    pub async fn delete_document(&self, id: i64) -> Result<bool> {
        let Some(doc) = self.store.get_document(id)? else {
            return Ok(false);
        };

        if let Some(index) = self.indexes.get(&doc.source) {
            let removed = index.delete_by_doc_id(id).await?;
            tracing::debug!("Removed {} vectors for doc {}", removed, id);
        }
        self.store.delete_document(id)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn get_document(&self, id: i64) -> Result<Option<Document>> {
        self.store.get_document(id)
    }

    pub fn list_documents(&self, limit: usize, source: Option<Source>) -> Result<Vec<Document>> {
        self.store.list_documents(limit, source)
    }

    pub fn search_keyword(
        &self,
        query: &str,
        limit: usize,
        source: Option<Source>,
    ) -> Result<Vec<FtsSearchResult>> {
        self.store.search_fts(query, limit, source)
    }

    /// Retrieval agent over every source table with the given weights
    pub fn retrieval_agent(&self, top_k: usize, weights: &SourceWeights) -> Result<RetrievalAgent> {
        let mut agent = RetrievalAgent::new(self.embedder()?, top_k);
        for source in Source::ALL {
            if let Some(index) = self.indexes.get(&source) {
                agent = agent.with_index(source, index.clone(), source_weight(weights, source));
            }
        }
        Ok(agent)
    }

    pub async fn stats(&self) -> Result<KnowledgeStats> {
        let store = self.store.stats()?;

        let mut vectors_by_source = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            let count = match self.indexes.get(&source) {
                Some(index) => index.count().await?,
                None => 0,
            };
            vectors_by_source.push((source, count));
        }

        Ok(KnowledgeStats {
            store,
            vectors_by_source,
            embedder: self.embedder.as_ref().map(|e| e.name().to_string()),
        })
    }
}

/// Merge weight for a source
pub fn source_weight(weights: &SourceWeights, source: Source) -> f32 {
    match source {
        Source::Documents => weights.documents,
        Source::IndiaCode => weights.indiacode,
        Source::Judgments => weights.judgments,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_kb, FakeEmbedder};
    use tempfile::TempDir;

    fn doc(source: Source, url: &str, content: &str) -> NewDocument {
        NewDocument {
            source,
            url: url.to_string(),
            title: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_index_document_chunks_into_source_table() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);

        let content = "Case: State v. Kumar\nDate: 2019-01-01\nSummary: bail granted after delay";
        let report = kb
            .index_document(doc(Source::Judgments, "sci://2019/1", content), false)
            .await
            .unwrap();

        assert!(!report.skipped);
        assert!(report.chunks >= 2);
        assert!(matches!(report.outcome, UpsertOutcome::Inserted(_)));

        let judgments = kb.index(Source::Judgments).unwrap();
        assert_eq!(judgments.count().await.unwrap(), report.chunks);
        assert_eq!(kb.index(Source::Documents).unwrap().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_document_skipped_unless_forced() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);
        let d = doc(Source::Documents, "file:///notes.txt", "Section 420 cheating");

        let first = kb.index_document(d.clone(), false).await.unwrap();
        let second = kb.index_document(d.clone(), false).await.unwrap();
        assert!(second.skipped);
        assert_eq!(second.doc_id, first.doc_id);

        let forced = kb.index_document(d, true).await.unwrap();
        assert!(!forced.skipped);
        assert_eq!(forced.chunks, first.chunks);

        // vectors replaced, not duplicated
        let count = kb.index(Source::Documents).unwrap().count().await.unwrap();
        assert_eq!(count, first.chunks);
    }

    #[tokio::test]
    async fn test_changed_document_replaces_vectors() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);

        kb.index_document(doc(Source::Documents, "file:///a", "old text"), false)
            .await
            .unwrap();
        let report = kb
            .index_document(doc(Source::Documents, "file:///a", "new text"), false)
            .await
            .unwrap();

        assert!(matches!(report.outcome, UpsertOutcome::Updated(_)));
        let index = kb.index(Source::Documents).unwrap();
        let texts: Vec<_> = index
            .search(&FakeEmbedder::vector("new text"), 10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.chunk_text)
            .collect();
        assert_eq!(texts, vec!["new text"]);
    }

    #[tokio::test]
    async fn test_delete_document_removes_vectors() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);

        let report = kb
            .index_document(doc(Source::IndiaCode, "indiacode://allacts/x", "Title: X Act"), false)
            .await
            .unwrap();

        assert!(kb.delete_document(report.doc_id).await.unwrap());
        assert!(kb.get_document(report.doc_id).unwrap().is_none());
        assert_eq!(kb.index(Source::IndiaCode).unwrap().count().await.unwrap(), 0);
        assert!(!kb.delete_document(report.doc_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_prune_source_keeps_listed_urls() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);

        for url in ["sci://1", "sci://2", "sci://3"] {
            kb.index_document(doc(Source::Judgments, url, url), false)
                .await
                .unwrap();
        }
        kb.index_document(doc(Source::Documents, "file:///x", "x"), false)
            .await
            .unwrap();

        let keep: HashSet<String> = ["sci://2".to_string()].into_iter().collect();
        assert_eq!(kb.prune_source(Source::Judgments, &keep).await.unwrap(), 2);

        let remaining = kb.list_documents(10, None).unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(kb.index(Source::Judgments).unwrap().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_without_embedder_fails() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::open_in(dir.path()).unwrap();
        let kb = KnowledgeBase::from_parts(
            store,
            HashMap::new(),
            None,
            character_chunker(ChunkConfig::default()),
        );

        let err = kb
            .index_document(doc(Source::Documents, "file:///a", "text"), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        assert!(kb.list_documents(10, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_counts_vectors_per_source() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);
        kb.index_document(doc(Source::Documents, "file:///a", "short"), false)
            .await
            .unwrap();

        let stats = kb.stats().await.unwrap();
        assert_eq!(stats.store.document_count, 1);
        assert!(stats.vectors_by_source.contains(&(Source::Documents, 1)));
        assert!(stats.vectors_by_source.contains(&(Source::Judgments, 0)));
        assert_eq!(stats.embedder.as_deref(), Some("fake"));
    }

    #[test]
    fn test_source_weight() {
        let w = SourceWeights::default();
        assert_eq!(source_weight(&w, Source::Documents), 1.0);
        assert_eq!(source_weight(&w, Source::IndiaCode), 0.85);
        assert_eq!(source_weight(&w, Source::Judgments), 0.75);
    }
}
