//! Knowledge module - document storage and vector indexes
//!
//! - SQLite: document text, FTS5 keyword search, IndiaCode Act table
//! - LanceDB: one vector table per source (ANN search)
//! - Chunker: newline-separated character splitter
//! - KnowledgeBase: ties the stores, embedder and chunker together

mod base;
mod chunker;
mod lance;
mod store;
mod vector;

// Re-exports
pub use base::{source_weight, IndexReport, KnowledgeBase, KnowledgeStats};
pub use chunker::{
    character_chunker, chunk_texts, default_chunker, CharacterChunker, ChunkConfig, Chunker,
};
pub use lance::LanceVectorStore;
pub use store::{
    content_hash, Document, FtsSearchResult, KnowledgeStore, NewDocument, Source, StoreStats,
    UpsertOutcome,
};
pub use vector::{
    cosine_similarity, distance_to_similarity, SearchResult, VectorEntry, VectorStore,
    EMBEDDING_DIMENSION,
};
