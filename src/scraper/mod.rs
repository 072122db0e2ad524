//! Supreme Court landmark judgment scraper
//!
//! Scrapes the yearly "landmark judgment summaries" tables from sci.gov.in,
//! caches them as JSON, and indexes each judgment into the `judgments` table.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::knowledge::{content_hash, KnowledgeBase, NewDocument, Source};
use crate::text::normalize_whitespace;

pub const SCI_BASE_URL: &str = "https://www.sci.gov.in/landmark-judgment-summaries/";

/// Cache file name inside the data directory
pub const JUDGMENTS_CACHE_FILE: &str = "landmark_judgments.json";

const YEAR_DELAY: Duration = Duration::from_secs(1);

// ============================================================================
// Judgment
// ============================================================================

/// One row of a landmark judgment summaries table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub year: i32,
    pub serial: String,
    pub date: String,
    pub case_name: String,
    pub summary: String,
    pub justices: Option<String>,
    pub pdf_link: Option<String>,
}

impl Judgment {
    /// Stable document key
    pub fn url(&self) -> String {
        match &self.pdf_link {
            Some(link) => link.clone(),
            None => format!(
                "sci://{}/{}",
                self.year,
                &content_hash(&format!("{}|{}", self.case_name, self.date))[..16]
            ),
        }
    }

    pub fn to_text_block(&self) -> String {
        format!(
            "Case: {}\nDate: {}\nJustices: {}\nSummary: {}\nPDF_Link: {}",
            self.case_name,
            self.date,
            self.justices.as_deref().unwrap_or(""),
            self.summary,
            self.pdf_link.as_deref().unwrap_or("")
        )
    }

    fn to_document(&self) -> NewDocument {
        NewDocument {
            source: Source::Judgments,
            url: self.url(),
            title: Some(self.case_name.clone()),
            content: self.to_text_block(),
        }
    }
}

// ============================================================================
// HTML Parsing
// ============================================================================

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Invalid selector '{}': {}", css, e))
}

/// Trimmed text nodes joined with `sep`
fn cell_text(cell: &ElementRef, sep: &str) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Cell text as a single line
fn cell_line(cell: &ElementRef) -> String {
    normalize_whitespace(&cell_text(cell, " "))
}

/// Parse a year page; rows with fewer than 5 cells are skipped
pub fn parse_judgments(html: &str, year: i32, page_url: &Url) -> Result<Vec<Judgment>> {
    let document = Html::parse_document(html);
    let row_sel = selector("table tbody tr")?;
    let cell_sel = selector("td")?;
    let pdf_sel = selector("a[href*='view-pdf']")?;

    let mut judgments = Vec::new();

    for row in document.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 5 {
            continue;
        }

        let details = &cells[4];
        let justices = details
            .text()
            .find(|t| t.contains("Justice") || t.contains("J."))
            .map(|t| t.trim().to_string());

        let pdf_link = details
            .select(&pdf_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| match page_url.join(href.trim()) {
                Ok(u) => Some(u.to_string()),
                Err(e) => {
                    tracing::debug!("Bad PDF link '{}': {}", href, e);
                    None
                }
            });

        judgments.push(Judgment {
            year,
            serial: cell_text(&cells[0], ""),
            date: cell_text(&cells[1], ""),
            case_name: cell_line(&cells[2]),
            summary: cell_line(&cells[3]),
            justices,
            pdf_link,
        });
    }

    Ok(judgments)
}

// ============================================================================
// JudgmentScraper
// ============================================================================

pub struct JudgmentScraper {
    client: reqwest::Client,
    base_url: Url,
    delay: Duration,
}

impl JudgmentScraper {
    pub fn new() -> Result<Self> {
        let base_url = Url::parse(SCI_BASE_URL).context("Invalid SCI base URL")?;
        Self::with_base_url(base_url, YEAR_DELAY)
    }

    /// Scraper against another host, with a custom pause between years
    pub fn with_base_url(base_url: Url, delay: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nyaya-rag/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            delay,
        })
    }

    pub fn year_url(&self, year: i32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("judgment_year", &year.to_string());
        url
    }

    /// All landmark judgments listed for one year
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<Judgment>> {
        let url = self.year_url(year);
        tracing::info!("Fetching year {}...", year);

        let html = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad response for year {}", year))?
            .text()
            .await
            .context("Failed to read response body")?;

        parse_judgments(&html, year, &url)
    }

    /// Scrape `start..=end` sequentially; failed years are logged and skipped
    pub async fn scrape_years(&self, start: i32, end: i32) -> ScrapeOutcome {
        let mut outcome = ScrapeOutcome::default();

        for year in start..=end {
            match self.fetch_year(year).await {
                Ok(rows) => {
                    tracing::debug!("Year {}: {} judgments", year, rows.len());
                    outcome.judgments.extend(rows);
                }
                Err(e) => {
                    tracing::warn!("Error fetching {}: {:#}", year, e);
                    outcome.failed_years.push(year);
                }
            }

            if year < end && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        outcome
    }

    /// Read the JSON cache, or scrape and write it when missing or `refresh`
    ///
    /// When some years fail, their rows are taken from the existing cache
    /// and the cache file is left untouched.
    pub async fn load_or_scrape(
        &self,
        cache: &Path,
        refresh: bool,
        start: i32,
        end: i32,
    ) -> Result<ScrapeOutcome> {
        if !refresh && cache.exists() {
            let judgments = load_cache(cache)?;
            tracing::info!("Loaded {} judgments from {:?}", judgments.len(), cache);
            return Ok(ScrapeOutcome {
                judgments,
                failed_years: Vec::new(),
            });
        }

        println!("[*] Scraping Supreme Court landmark judgments ({}-{})...", start, end);
        let mut outcome = self.scrape_years(start, end).await;

        if outcome.is_complete() {
            save_cache(cache, &outcome.judgments)?;
            println!("[OK] Saved {} judgments to {}", outcome.judgments.len(), cache.display());
            return Ok(outcome);
        }

        println!(
            "[!] Failed to fetch {} year(s): {:?}. Keeping the existing cache.",
            outcome.failed_years.len(),
            outcome.failed_years
        );
        if cache.exists() {
            let cached = load_cache(cache)?;
            outcome.judgments.extend(
                cached
                    .into_iter()
                    .filter(|j| outcome.failed_years.contains(&j.year)),
            );
        }
        Ok(outcome)
    }
}

/// Judgments gathered by a scrape, and the years that could not be fetched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeOutcome {
    pub judgments: Vec<Judgment>,
    pub failed_years: Vec<i32>,
}

impl ScrapeOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_years.is_empty()
    }
}

pub fn load_cache(path: &Path) -> Result<Vec<Judgment>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid judgment cache {}", path.display()))
}

pub fn save_cache(path: &Path, judgments: &[Judgment]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }
    }
    let json = serde_json::to_string_pretty(judgments)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// Index Build
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgmentIndexReport {
    pub judgments: usize,
    pub indexed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub pruned: usize,
}

/// Index every judgment; with `prune`, drop indexed ones no longer present
pub async fn build_judgment_index(
    kb: &KnowledgeBase,
    judgments: &[Judgment],
    prune: bool,
) -> Result<JudgmentIndexReport> {
    if judgments.is_empty() {
        anyhow::bail!("No judgments to index");
    }

    let mut report = JudgmentIndexReport {
        judgments: judgments.len(),
        ..Default::default()
    };
    let mut keep = HashSet::with_capacity(judgments.len());

    for judgment in judgments {
        keep.insert(judgment.url());
        match kb.index_document(judgment.to_document(), false).await {
            Ok(r) if r.skipped => report.unchanged += 1,
            Ok(_) => report.indexed += 1,
            Err(e) => {
                tracing::warn!("Failed to index '{}': {:#}", judgment.case_name, e);
                report.failed += 1;
            }
        }
    }

    if prune {
        report.pruned = kb.prune_source(Source::Judgments, &keep).await?;
    }

    tracing::info!(
        "Judgment index built: {} judgments ({} indexed, {} unchanged)",
        report.judgments,
        report.indexed,
        report.unchanged
    );
    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_kb;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <html><body>
        <table>
          <thead><tr><th>S.No</th><th>Date</th><th>Case</th><th>Summary</th><th>Details</th></tr></thead>
          <tbody>
            <tr>
              <td> 1 </td>
              <td>24-08-2017</td>
              <td><b>Justice K.S. Puttaswamy (Retd.)</b>
                  <span>vs Union of India</span></td>
              <td>Right to privacy is a
                  fundamental right.</td>
              <td>
                <p>Coram</p>
                <p>Hon'ble Justice J.S. Khehar</p>
                <a href="/view-pdf/?diary_no=1234">PDF</a>
              </td>
            </tr>
            <tr><td colspan="5">No more records</td></tr>
            <tr>
              <td>2</td><td>06-09-2018</td><td>Navtej Singh Johar v. UoI</td>
              <td>Section 377 read down.</td><td><span>Bench: 5</span></td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    fn page_url() -> Url {
        Url::parse("https://www.sci.gov.in/landmark-judgment-summaries/?judgment_year=2017").unwrap()
    }

    #[test]
    fn test_parse_judgments() {
        let rows = parse_judgments(PAGE, 2017, &page_url()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.serial, "1");
        assert_eq!(first.date, "24-08-2017");
        assert_eq!(first.case_name, "Justice K.S. Puttaswamy (Retd.) vs Union of India");
        assert_eq!(first.summary, "Right to privacy is a fundamental right.");
        assert_eq!(first.justices.as_deref(), Some("Hon'ble Justice J.S. Khehar"));
        assert_eq!(
            first.pdf_link.as_deref(),
            Some("https://www.sci.gov.in/view-pdf/?diary_no=1234")
        );

        let second = &rows[1];
        assert!(second.justices.is_none());
        assert!(second.pdf_link.is_none());
    }

    #[test]
    fn test_to_text_block() {
        let rows = parse_judgments(PAGE, 2017, &page_url()).unwrap();
        assert_eq!(
            rows[1].to_text_block(),
            "Case: Navtej Singh Johar v. UoI\nDate: 06-09-2018\nJustices: \n\
             Summary: Section 377 read down.\nPDF_Link: "
        );
    }

    #[test]
    fn test_judgment_url_is_stable() {
        let rows = parse_judgments(PAGE, 2017, &page_url()).unwrap();
        assert_eq!(rows[0].url(), "https://www.sci.gov.in/view-pdf/?diary_no=1234");
        assert!(rows[1].url().starts_with("sci://2017/"));
        assert_eq!(rows[1].url(), rows[1].clone().url());
    }

    #[test]
    fn test_year_url() {
        let scraper = JudgmentScraper::new().unwrap();
        assert_eq!(
            scraper.year_url(2019).as_str(),
            "https://www.sci.gov.in/landmark-judgment-summaries/?judgment_year=2019"
        );
    }

    #[tokio::test]
    async fn test_scrape_years_skips_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summaries/"))
            .and(query_param("judgment_year", "2017"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/summaries/"))
            .and(query_param("judgment_year", "2018"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/summaries/", server.uri())).unwrap();
        let scraper = JudgmentScraper::with_base_url(base, Duration::ZERO).unwrap();

        let outcome = scraper.scrape_years(2017, 2018).await;
        assert_eq!(outcome.judgments.len(), 2);
        assert!(outcome.judgments.iter().all(|j| j.year == 2017));
        assert_eq!(outcome.failed_years, vec![2018]);
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_refresh_with_failed_year_keeps_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summaries/"))
            .and(query_param("judgment_year", "2017"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/summaries/"))
            .and(query_param("judgment_year", "2018"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(JUDGMENTS_CACHE_FILE);
        let mut cached = parse_judgments(PAGE, 2017, &page_url()).unwrap();
        let mut from_2018 = cached[1].clone();
        from_2018.year = 2018;
        cached.push(from_2018.clone());
        save_cache(&cache, &cached).unwrap();

        let base = Url::parse(&format!("{}/summaries/", server.uri())).unwrap();
        let scraper = JudgmentScraper::with_base_url(base, Duration::ZERO).unwrap();

        let outcome = scraper.load_or_scrape(&cache, true, 2017, 2018).await.unwrap();
        assert_eq!(outcome.failed_years, vec![2018]);
        assert_eq!(outcome.judgments.len(), 3);
        assert_eq!(outcome.judgments[2], from_2018);
        assert_eq!(load_cache(&cache).unwrap(), cached);
    }

    #[tokio::test]
    async fn test_refresh_all_years_failed_keeps_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(JUDGMENTS_CACHE_FILE);
        let cached = parse_judgments(PAGE, 2017, &page_url()).unwrap();
        save_cache(&cache, &cached).unwrap();

        let base = Url::parse(&format!("{}/summaries/", server.uri())).unwrap();
        let scraper = JudgmentScraper::with_base_url(base, Duration::ZERO).unwrap();

        let outcome = scraper.load_or_scrape(&cache, true, 2017, 2017).await.unwrap();
        assert_eq!(outcome.failed_years, vec![2017]);
        assert_eq!(outcome.judgments, cached);
        assert_eq!(load_cache(&cache).unwrap(), cached);
    }

    #[tokio::test]
    async fn test_load_or_scrape_uses_cache() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join(JUDGMENTS_CACHE_FILE);
        let cached = parse_judgments(PAGE, 2017, &page_url()).unwrap();
        save_cache(&cache, &cached).unwrap();

        // unreachable host: any network call would fail the test
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let scraper = JudgmentScraper::with_base_url(base, Duration::ZERO).unwrap();

        let loaded = scraper.load_or_scrape(&cache, false, 2017, 2017).await.unwrap();
        assert!(loaded.is_complete());
        assert_eq!(loaded.judgments, cached);
    }

    #[tokio::test]
    async fn test_build_judgment_index() {
        let dir = TempDir::new().unwrap();
        let kb = test_kb(&dir);
        let rows = parse_judgments(PAGE, 2017, &page_url()).unwrap();

        let report = build_judgment_index(&kb, &rows, true).await.unwrap();
        assert_eq!(report.judgments, 2);
        assert_eq!(report.indexed, 2);
        assert_eq!(kb.list_documents(10, Some(Source::Judgments)).unwrap().len(), 2);

        // partial scrape: nothing is removed
        let report = build_judgment_index(&kb, &rows[..1], false).await.unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.pruned, 0);
        assert_eq!(kb.list_documents(10, Some(Source::Judgments)).unwrap().len(), 2);

        let report = build_judgment_index(&kb, &rows[..1], true).await.unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.pruned, 1);

        assert!(build_judgment_index(&kb, &[], true).await.is_err());
    }
}
