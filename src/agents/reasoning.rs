//! Plan, retrieve, summarize, answer
//!
//! The reasoning agent drives one question end to end:
//! 1. ask the LLM for a short plan
//! 2. retrieve passages from every indexed source
//! 3. summarize the retrieved context
//! 4. ask for the final answer over the summary
//! 5. attach IndiaCode citations for Acts named along the way

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use super::retrieval::{join_passages, RetrievalAgent, RetrievedPassage};
use super::summarizer::SummarizerAgent;
use crate::indiacode::{citations_markdown, ActCatalog, ActCitation};
use crate::llm::LlmClient;

/// Everything produced for one question
#[derive(Debug, Clone, Serialize)]
pub struct LegalAnswer {
    pub plan: String,
    pub summary: String,
    /// Model answer with the citations block appended
    pub answer: String,
    pub citations: Vec<ActCitation>,
    #[serde(skip)]
    pub passages: Vec<RetrievedPassage>,
}

impl LegalAnswer {
    pub fn render(&self) -> String {
        format!(
            "Plan:\n{}\n\nAnswer:\n{}\n\nContext summary:\n{}",
            self.plan, self.answer, self.summary
        )
    }
}

pub struct ReasoningAgent {
    llm: Arc<dyn LlmClient>,
    retriever: RetrievalAgent,
    summarizer: SummarizerAgent,
    catalog: Option<ActCatalog>,
}

impl ReasoningAgent {
    pub fn new(llm: Arc<dyn LlmClient>, retriever: RetrievalAgent, summarizer: SummarizerAgent) -> Self {
        Self {
            llm,
            retriever,
            summarizer,
            catalog: None,
        }
    }

    /// Match Act names against this catalog when answering
    pub fn with_catalog(mut self, catalog: ActCatalog) -> Self {
        self.catalog = if catalog.is_empty() { None } else { Some(catalog) };
        self
    }

    pub async fn plan(&self, query: &str) -> Result<String> {
        let prompt = format!(
            "You are a legal planner for Indian law. Given the question below, \
             return 2-3 short numbered steps describing how you'd answer it \
             (identify relevant Acts/Sections, retrieve materials, summarize, reason).\n\n\
             Question: {}",
            query
        );
        let plan = self.llm.generate(&prompt).await.context("Planning failed")?;
        Ok(plan.trim().to_string())
    }

    pub async fn run(&self, query: &str) -> Result<LegalAnswer> {
        let query = query.trim();
        if query.is_empty() {
            anyhow::bail!("Question is empty");
        }

        let plan = self.plan(query).await?;
        tracing::debug!("Plan: {}", plan);

        let passages = self.retriever.retrieve_passages(query).await?;
        tracing::info!("Retrieved {} passages", passages.len());

        let context = join_passages(&passages);
        let summary = self.summarizer.summarize(&context).await?;

        let prompt = format!(
            "You are an expert in Indian law. Use the context summary and the retrieved materials \
             to answer the question. Be precise and include citations where applicable \
             (e.g., Section 420 IPC, Act: The Coinage Act, 2011). \
             Respond with: Short answer and Relevant citations.\n\n\
             Context summary:\n{}\n\nQuestion: {}",
            summary, query
        );
        let mut answer = self
            .llm
            .generate(&prompt)
            .await
            .context("Answer generation failed")?
            .trim()
            .to_string();

        let citations = match &self.catalog {
            Some(catalog) => {
                let mut texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
                texts.push(query);
                texts.push(&answer);
                catalog.match_citations(&texts)
            }
            None => Vec::new(),
        };
        answer.push_str(&citations_markdown(&citations));

        Ok(LegalAnswer {
            plan,
            summary,
            answer,
            citations,
            passages,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indiacode::ActRecord;
    use crate::knowledge::Source;
    use crate::llm::LlmError;
    use crate::testing::{FakeEmbedder, MemoryVectorStore, ScriptedLlm};

    fn retriever(texts: &[&str]) -> RetrievalAgent {
        RetrievalAgent::new(Arc::new(FakeEmbedder), 3).with_index(
            Source::IndiaCode,
            Arc::new(MemoryVectorStore::with_texts("indiacode", texts)),
            0.85,
        )
    }

    fn agent(llm: Arc<ScriptedLlm>, texts: &[&str]) -> ReasoningAgent {
        ReasoningAgent::new(llm.clone(), retriever(texts), SummarizerAgent::new(llm, 4000))
    }

    fn catalog() -> ActCatalog {
        ActCatalog::new(
            vec![
                ActRecord {
                    title: "The Indian Penal Code".to_string(),
                    short_title: "Indian Penal Code".to_string(),
                    act_year: "1860".to_string(),
                    pdf_links: vec!["https://ic/ipc.pdf".to_string()],
                    ..Default::default()
                },
                ActRecord {
                    title: "The Coinage Act, 2011".to_string(),
                    act_year: "2011".to_string(),
                    pdf_links: vec!["https://ic/coinage.pdf".to_string()],
                    ..Default::default()
                },
            ],
            0.75,
        )
    }

    #[tokio::test]
    async fn test_run_pipeline_order() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "1. Find the section\n2. Answer",
            "- cheating is punishable",
            "Short answer: yes.",
        ]));
        let agent = agent(llm.clone(), &["Section 420 punishes cheating."]);

        let result = agent.run("Is cheating an offence?").await.unwrap();
        assert_eq!(result.plan, "1. Find the section\n2. Answer");
        assert_eq!(result.summary, "- cheating is punishable");
        assert_eq!(result.answer, "Short answer: yes.");
        assert!(result.citations.is_empty());
        assert_eq!(result.passages.len(), 1);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("2-3 short numbered steps"));
        assert!(prompts[0].ends_with("Question: Is cheating an offence?"));
        assert!(prompts[1].contains("Section 420 punishes cheating."));
        assert!(prompts[2].contains("Context summary:\n- cheating is punishable"));
        assert!(prompts[2].contains("Short answer and Relevant citations"));
    }

    #[tokio::test]
    async fn test_empty_context_skips_summary_call() {
        let llm = Arc::new(ScriptedLlm::replying(&["1. Think", "No materials found."]));
        let agent = agent(llm.clone(), &[]);

        let result = agent.run("What is a tort?").await.unwrap();
        assert_eq!(result.summary, "");
        assert_eq!(result.answer, "No materials found.");
        assert_eq!(llm.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_citations_appended() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "1. Check the Acts",
            "- counterfeit coins",
            "Offence under the Coinage Act, 2011.",
        ]));
        let agent = agent(llm, &["Punishment under IPC for counterfeiting."]).with_catalog(catalog());

        let result = agent.run("Is making fake coins illegal?").await.unwrap();
        let titles: Vec<&str> = result.citations.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["The Coinage Act, 2011", "The Indian Penal Code"]);
        assert!(result.answer.starts_with("Offence under the Coinage Act, 2011."));
        assert!(result
            .answer
            .contains("**IndiaCode Sources:**\n- The Coinage Act, 2011 (2011): https://ic/coinage.pdf"));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_ignored() {
        let llm = Arc::new(ScriptedLlm::replying(&["1. Plan", "- s", "IPC applies."]));
        let agent = agent(llm, &["IPC text"]).with_catalog(ActCatalog::new(vec![], 0.75));

        let result = agent.run("q").await.unwrap();
        assert_eq!(result.answer, "IPC applies.");
    }

    #[tokio::test]
    async fn test_errors() {
        let llm = Arc::new(ScriptedLlm::replying(&[]));
        assert!(agent(llm.clone(), &[]).run("  ").await.is_err());
        assert!(llm.prompts().is_empty());

        let llm = Arc::new(ScriptedLlm::new(vec![Err(LlmError::Api {
            status: 400,
            body: "bad request".to_string(),
        })]));
        let err = agent(llm, &[]).run("q").await.unwrap_err();
        assert!(format!("{:#}", err).contains("Planning failed"));
    }

    #[test]
    fn test_render() {
        let answer = LegalAnswer {
            plan: "1. a".to_string(),
            summary: "- b".to_string(),
            answer: "c".to_string(),
            citations: vec![],
            passages: vec![],
        };
        assert_eq!(answer.render(), "Plan:\n1. a\n\nAnswer:\nc\n\nContext summary:\n- b");
    }
}
