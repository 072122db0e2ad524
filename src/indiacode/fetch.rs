//! Act PDF download
//!
//! Downloads the official PDF for a matched Act and indexes its full text as a
//! document, so later questions can retrieve the statute itself.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use super::ActCitation;
use crate::collector::FileType;
use crate::extractor::ContentExtractor;
use crate::knowledge::{IndexReport, KnowledgeBase, NewDocument, Source};

pub const INDIACODE_BASE_URL: &str = "https://www.indiacode.nic.in";

const USER_AGENT: &str = concat!("nyaya-rag/", env!("CARGO_PKG_VERSION"));

/// Absolute URL for a (possibly site-relative) IndiaCode PDF link
pub fn resolve_pdf_link(link: &str) -> Result<Url> {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(INDIACODE_BASE_URL)
            .and_then(|base| base.join(link))
            .with_context(|| format!("Invalid PDF link: {}", link)),
        Err(e) => Err(anyhow::anyhow!("Invalid PDF link '{}': {}", link, e)),
    }
}

pub struct ActPdfFetcher {
    client: reqwest::Client,
}

impl ActPdfFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// Download a PDF; non-2xx responses and non-PDF bodies are errors
    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        tracing::info!("Downloading {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Download failed ({}): {}", status.as_u16(), url);
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        if !bytes.starts_with(b"%PDF") {
            anyhow::bail!("Response from {} is not a PDF", url);
        }

        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Download the first PDF of a matched Act and index its text
pub async fn fetch_and_index(
    kb: &KnowledgeBase,
    fetcher: &ActPdfFetcher,
    extractor: &ContentExtractor,
    citation: &ActCitation,
    force: bool,
) -> Result<IndexReport> {
    let link = citation
        .pdf_links
        .first()
        .ok_or_else(|| anyhow::anyhow!("No PDF link for '{}'", citation.title))?;
    let url = resolve_pdf_link(link)?;

    let bytes = fetcher.fetch(&url).await?;
    let text = extractor
        .extract_bytes(Path::new(url.path()), FileType::Pdf, bytes)
        .await
        .with_context(|| format!("Failed to extract text from {}", url))?;

    if text.trim().is_empty() {
        anyhow::bail!("No text extracted from {}", url);
    }

    kb.index_document(
        NewDocument {
            source: Source::Documents,
            url: url.to_string(),
            title: Some(citation.title.clone()),
            content: text,
        },
        force,
    )
    .await
}

// ============================================================================
// Tests
// ============================================================================
