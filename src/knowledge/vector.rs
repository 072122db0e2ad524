//! Vector Store - async vector search trait and helpers
//!
//! One store instance per source table (`documents`, `indiacode`, `judgments`).

use anyhow::Result;
use async_trait::async_trait;

/// Default embedding dimension (gemini-embedding-001 with output_dimensionality=768)
/// ref: https://ai.google.dev/gemini-api/docs/embeddings
pub const EMBEDDING_DIMENSION: i32 = 768;

// ============================================================================
// Types
// ============================================================================

/// Vector row to store
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// documents.id in the knowledge store
    pub doc_id: i64,
    /// 0-based chunk index within the document
    pub chunk_index: i32,
    pub chunk_text: String,
    pub embedding: Vec<f32>,
}

/// Vector search hit
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub doc_id: i64,
    pub chunk_index: i32,
    pub chunk_text: String,
    /// Higher is closer, in (0.0, 1.0]
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a batch of vectors
    async fn insert_batch(&self, entries: &[VectorEntry]) -> Result<usize>;

    /// Nearest neighbours of `query_embedding`, closest first
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Remove every chunk of a document
    async fn delete_by_doc_id(&self, doc_id: i64) -> Result<usize>;

    async fn count(&self) -> Result<usize>;

    async fn has_embeddings(&self, doc_id: i64) -> Result<bool>;

    /// Table name, for logging and status output
    fn name(&self) -> &str;
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Cosine similarity in [-1.0, 1.0]; 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Map an L2 distance to a similarity in (0.0, 1.0]
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_same() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_mismatched() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_distance_to_similarity() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert!((distance_to_similarity(1.0) - 0.5).abs() < 1e-6);
        assert!(distance_to_similarity(3.0) < distance_to_similarity(1.0));
        assert_eq!(distance_to_similarity(-0.01), 1.0);
    }
}
