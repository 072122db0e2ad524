//! Content extraction
//!
//! Turns uploaded files into plain text:
//! - TXT/MD: read as UTF-8 (lossy)
//! - DOCX: paragraphs from `word/document.xml`
//! - PDF: `pdf-extract`, with LLM OCR for scanned pages
//! - Images: LLM OCR

pub mod docx;
pub mod pdf;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::collector::{CollectedFile, FileType};
use crate::llm::LlmClient;
use crate::text::fix_text_spacing;

const IMAGE_OCR_PROMPT: &str = "Transcribe all readable text in this image of a legal document \
    exactly as written, preserving paragraph breaks. Return only the text.";

// ============================================================================
// Extracted Content
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub source_type: FileType,
    /// File name shown in listings
    pub file_name: String,
}

// ============================================================================
// Content Extractor
// ============================================================================

pub struct ContentExtractor {
    /// Used for scanned PDF pages and images
    ocr: Option<Arc<dyn LlmClient>>,
}

impl ContentExtractor {
    pub fn new(ocr: Option<Arc<dyn LlmClient>>) -> Self {
        Self { ocr }
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Extract a collected file
    pub async fn extract(&self, file: &CollectedFile) -> Result<ExtractedContent> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", file.path))?;

        let text = self
            .extract_bytes(&file.path, file.file_type, bytes)
            .await
            .with_context(|| format!("Failed to extract {:?}", file.path))?;

        Ok(ExtractedContent {
            text,
            source_type: file.file_type,
            file_name: file.file_name(),
        })
    }

    /// Extract text from in-memory bytes; `path` only supplies the extension
    pub async fn extract_bytes(
        &self,
        path: &Path,
        file_type: FileType,
        bytes: Vec<u8>,
    ) -> Result<String> {
        match file_type {
            FileType::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            FileType::Docx => docx::extract_text_from_docx(&bytes),
            FileType::Pdf => pdf::extract_pdf_text(bytes, self.ocr.as_deref()).await,
            FileType::Image => self.extract_image(path, file_type, &bytes).await,
        }
    }

    async fn extract_image(&self, path: &Path, file_type: FileType, bytes: &[u8]) -> Result<String> {
        let llm = self
            .ocr
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY required for image OCR"))?;

        let mime_type = file_type.mime_type(path).unwrap_or("image/jpeg");
        let text = llm
            .generate_with_document(IMAGE_OCR_PROMPT, mime_type, bytes)
            .await
            .context("Image OCR failed")?;

        Ok(fix_text_spacing(&text))
    }

    /// Extract every file and concatenate the texts
    ///
    /// Files that fail are logged and skipped; getting no text at all is an error.
    pub async fn extract_documents(&self, files: &[CollectedFile]) -> Result<String> {
        let mut texts = Vec::with_capacity(files.len());

        for file in files {
            match self.extract(file).await {
                Ok(content) if !content.text.trim().is_empty() => texts.push(content.text),
                Ok(_) => tracing::warn!("No text in {:?}", file.path),
                Err(e) => tracing::warn!("Skipping {:?}: {:#}", file.path, e),
            }
        }

        if texts.is_empty() {
            anyhow::bail!("No text extracted from {} file(s)", files.len());
        }

        Ok(texts.join("\n"))
    }
}

// ============================================================================
// Tests
// ============================================================================
