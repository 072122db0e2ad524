//! nyaya-rag - Indian legal research RAG assistant
//!
//! Three independently built vector indexes (uploaded documents, IndiaCode
//! Acts, Supreme Court landmark judgments) live in LanceDB next to a SQLite
//! document store. Questions are answered by a plan, retrieve, summarize,
//! answer pipeline on Gemini, with IndiaCode citations attached.

pub mod agents;
pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod extractor;
pub mod indiacode;
pub mod knowledge;
pub mod llm;
pub mod scraper;
pub mod text;

#[cfg(test)]
mod testing;

// Re-exports
pub use agents::{LegalAnswer, ReasoningAgent, RetrievalAgent, RetrievedPassage, SummarizerAgent};
pub use config::{get_api_key, has_api_key, resolve_data_dir, Settings, SourceWeights};
pub use embedding::{EmbeddingProvider, GeminiEmbedding};
pub use indiacode::{ActCatalog, ActCitation, ActRecord};
pub use knowledge::{
    ChunkConfig, Chunker, Document, FtsSearchResult, KnowledgeBase, KnowledgeStore, LanceVectorStore,
    NewDocument, SearchResult, Source, StoreStats, VectorEntry, VectorStore,
};
pub use llm::{GeminiClient, LlmClient, LlmError};
pub use scraper::{Judgment, JudgmentScraper};
