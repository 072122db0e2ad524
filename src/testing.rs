//! In-memory fakes for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::knowledge::{
    character_chunker, cosine_similarity, ChunkConfig, KnowledgeBase, KnowledgeStore,
    SearchResult, Source, VectorEntry, VectorStore,
};
use crate::llm::{LlmClient, LlmError};

pub const FAKE_DIMENSION: usize = 8;

/// Deterministic bag-of-bytes embedder
///
/// Texts sharing words land close together, which is enough for ranking tests.
pub struct FakeEmbedder;

impl FakeEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; FAKE_DIMENSION];
        for word in text.to_lowercase().split_whitespace() {
            let bucket = word.bytes().map(|b| b as usize).sum::<usize>() % FAKE_DIMENSION;
            v[bucket] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    fn dimension(&self) -> usize {
        FAKE_DIMENSION
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Vector store kept in a Vec, ranked by cosine similarity
pub struct MemoryVectorStore {
    name: String,
    entries: Mutex<Vec<VectorEntry>>,
}

impl MemoryVectorStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Store pre-built passages; each text becomes doc `i + 1`, chunk 0
    pub fn with_texts(name: &str, texts: &[&str]) -> Self {
        let store = Self::new(name);
        {
            let mut entries = store.entries.lock().unwrap();
            for (i, text) in texts.iter().enumerate() {
                entries.push(VectorEntry {
                    doc_id: i as i64 + 1,
                    chunk_index: 0,
                    chunk_text: text.to_string(),
                    embedding: FakeEmbedder::vector(text),
                });
            }
        }
        store
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.chunk_text.clone())
            .collect()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert_batch(&self, entries: &[VectorEntry]) -> Result<usize> {
        self.entries.lock().unwrap().extend_from_slice(entries);
        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.lock().unwrap();
        let mut results: Vec<SearchResult> = entries
            .iter()
            .map(|e| SearchResult {
                doc_id: e.doc_id,
                chunk_index: e.chunk_index,
                chunk_text: e.chunk_text.clone(),
                similarity: cosine_similarity(query_embedding, &e.embedding),
            })
            .collect();
        results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        results.truncate(limit);
        Ok(results)
    }

    async fn delete_by_doc_id(&self, doc_id: i64) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.doc_id != doc_id);
        Ok(before - entries.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.lock().unwrap().len())
    }

    async fn has_embeddings(&self, doc_id: i64) -> Result<bool> {
        Ok(self.entries.lock().unwrap().iter().any(|e| e.doc_id == doc_id))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// LLM that replays scripted replies and records every prompt
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.next(prompt)
    }

    async fn generate_with_document(
        &self,
        prompt: &str,
        _mime_type: &str,
        _data: &[u8],
    ) -> Result<String, LlmError> {
        self.next(prompt)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// KnowledgeBase over a temp SQLite file, in-memory vectors and the fake embedder
///
/// Chunks are at most 40 chars so short fixtures still produce several chunks.
pub fn test_kb(dir: &tempfile::TempDir) -> KnowledgeBase {
    let store = KnowledgeStore::open_in(dir.path()).unwrap();
    let indexes: HashMap<Source, Arc<dyn VectorStore>> = Source::ALL
        .into_iter()
        .map(|s| (s, Arc::new(MemoryVectorStore::new(s.as_str())) as Arc<dyn VectorStore>))
        .collect();
    KnowledgeBase::from_parts(
        store,
        indexes,
        Some(Arc::new(FakeEmbedder)),
        character_chunker(ChunkConfig::new(40, 0)),
    )
}
