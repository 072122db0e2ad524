//! Context summarization

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::llm::LlmClient;
use crate::text::truncate_chars;

pub struct SummarizerAgent {
    llm: Arc<dyn LlmClient>,
    max_chars: usize,
}

impl SummarizerAgent {
    pub fn new(llm: Arc<dyn LlmClient>, max_chars: usize) -> Self {
        Self { llm, max_chars }
    }

    /// Bullet-point summary of `text`; empty input yields `""` with no LLM call
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let text = truncate_chars(text, self.max_chars);
        let prompt = format!(
            "Summarize the following legal text into concise bullet points for a lawyer:\n\n{}",
            text
        );

        let summary = self
            .llm
            .generate(&prompt)
            .await
            .context("Summarization failed")?;
        Ok(summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[tokio::test]
    async fn test_empty_text_skips_llm() {
        let llm = Arc::new(ScriptedLlm::replying(&["unused"]));
        let agent = SummarizerAgent::new(llm.clone(), 100);

        assert_eq!(agent.summarize("").await.unwrap(), "");
        assert_eq!(agent.summarize(" \n ").await.unwrap(), "");
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_truncates_input() {
        let llm = Arc::new(ScriptedLlm::replying(&["- point one\n"]));
        let agent = SummarizerAgent::new(llm.clone(), 10);

        let summary = agent.summarize("Section 420 cheating and dishonesty").await.unwrap();
        assert_eq!(summary, "- point one");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Summarize the following legal text"));
        assert!(prompts[0].ends_with("\n\nSection 42"));
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![Err(crate::llm::LlmError::MissingApiKey)]));
        let agent = SummarizerAgent::new(llm, 100);

        let err = agent.summarize("some text").await.unwrap_err();
        assert!(format!("{:#}", err).contains("GEMINI_API_KEY"));
    }
}
