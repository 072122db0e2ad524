//! Agents - the question answering pipeline
//!
//! [`RetrievalAgent`] merges vector hits from every source,
//! [`SummarizerAgent`] condenses them and [`ReasoningAgent`] ties the steps
//! together into a cited answer.

mod reasoning;
mod retrieval;
mod summarizer;

pub use reasoning::{LegalAnswer, ReasoningAgent};
pub use retrieval::{join_passages, RetrievalAgent, RetrievedPassage, PASSAGE_SEPARATOR};
pub use summarizer::SummarizerAgent;
