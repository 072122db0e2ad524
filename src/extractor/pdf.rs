//! PDF text extraction with OCR fallback
//!
//! Text is pulled page by page with `pdf-extract`. Pages with (almost) no text
//! are assumed to be scans and are read by the LLM instead.

use anyhow::{Context, Result};

use crate::llm::LlmClient;
use crate::text::fix_text_spacing;

/// Pages whose trimmed text is shorter than this are OCR'd
pub const MIN_PAGE_TEXT_CHARS: usize = 10;

/// Per-page text from a PDF (blocking; call from `spawn_blocking`)
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    if !bytes.starts_with(b"%PDF") {
        anyhow::bail!("Not a PDF file (missing %PDF header)");
    }

    pdf_extract::extract_text_from_mem_by_pages(bytes).context("Failed to extract text from PDF")
}

fn needs_ocr(page: &str) -> bool {
    page.trim().chars().count() < MIN_PAGE_TEXT_CHARS
}

fn ocr_prompt(page_number: usize) -> String {
    format!(
        "This PDF is a scanned legal document. Transcribe all readable text on page {} \
         exactly as written. Return only the text of that page, without commentary.",
        page_number
    )
}

/// Fill in scanned pages and join everything into one text
///
/// `pages` is the `pdf-extract` output; `pdf` is the raw file, sent inline
/// for OCR. Page numbers in placeholders are 1-based.
pub async fn complete_pages(
    pages: Vec<String>,
    pdf: &[u8],
    ocr: Option<&dyn LlmClient>,
) -> String {
    let mut out = Vec::with_capacity(pages.len());

    for (i, page) in pages.into_iter().enumerate() {
        let page_number = i + 1;

        if !needs_ocr(&page) {
            out.push(fix_text_spacing(&page));
            continue;
        }

        let Some(llm) = ocr else {
            out.push(format!("[No text on page {}]", page_number));
            continue;
        };

        tracing::info!("Page {} has no text layer, running OCR", page_number);
        match llm
            .generate_with_document(&ocr_prompt(page_number), "application/pdf", pdf)
            .await
        {
            Ok(text) if !text.trim().is_empty() => out.push(fix_text_spacing(&text)),
            Ok(_) => {
                tracing::warn!("OCR returned no text for page {}", page_number);
                out.push(format!("[OCR failed on page {}]", page_number));
            }
            Err(e) => {
                tracing::warn!("OCR failed on page {}: {}", page_number, e);
                out.push(format!("[OCR failed on page {}]", page_number));
            }
        }
    }

    out.join("\n")
}

/// Extract a PDF's text, OCR'ing scanned pages when an LLM is available
pub async fn extract_pdf_text(bytes: Vec<u8>, ocr: Option<&dyn LlmClient>) -> Result<String> {
    // pdf-extract is CPU bound
    let (pages, bytes) = tokio::task::spawn_blocking(move || {
        let pages = extract_pages(&bytes);
        (pages, bytes)
    })
    .await
    .context("PDF extraction task failed")?;

    let pages = pages?;
    tracing::debug!("PDF has {} pages", pages.len());

    Ok(complete_pages(pages, &bytes, ocr).await)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::testing::ScriptedLlm;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_needs_ocr() {
        assert!(needs_ocr(""));
        assert!(needs_ocr("  12  \n"));
        assert!(!needs_ocr("Section 498A of the IPC"));
    }

    #[test]
    fn test_extract_pages_rejects_non_pdf() {
        let err = extract_pages(b"hello").unwrap_err();
        assert!(err.to_string().contains("Not a PDF"));
    }

    #[tokio::test]
    async fn test_text_pages_pass_through_spacing_fixed() {
        let text = complete_pages(pages(&["ORDER   dated  1.1.2020  ", "Appeal allowed."]), b"", None).await;
        assert_eq!(text, "ORDER dated 1.1.2020\nAppeal allowed.");
    }

    #[tokio::test]
    async fn test_scanned_page_without_ocr_gets_placeholder() {
        let text = complete_pages(pages(&["First page has text.", "  "]), b"", None).await;
        assert_eq!(text, "First page has text.\n[No text on page 2]");
    }

    #[tokio::test]
    async fn test_scanned_page_is_ocred() {
        let llm = ScriptedLlm::replying(&["Judgment   text from scan"]);
        let text = complete_pages(pages(&["", "Typed second page."]), b"%PDF", Some(&llm)).await;

        assert_eq!(text, "Judgment text from scan\nTyped second page.");
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("page 1"));
    }

    #[tokio::test]
    async fn test_ocr_failure_and_empty_result() {
        let llm = ScriptedLlm::new(vec![
            Err(LlmError::Api {
                status: 400,
                body: "bad".to_string(),
            }),
            Ok("   ".to_string()),
        ]);
        let text = complete_pages(pages(&["", ""]), b"%PDF", Some(&llm)).await;
        assert_eq!(text, "[OCR failed on page 1]\n[OCR failed on page 2]");
    }
}
