//! CLI module
//!
//! nyaya-rag command definitions and implementations

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::agents::{ReasoningAgent, SummarizerAgent};
use crate::collector::{CollectionStats, CollectorConfig, FileCollector};
use crate::config::{get_api_key, has_api_key, resolve_data_dir, Settings, CONFIG_FILE};
use crate::extractor::ContentExtractor;
use crate::indiacode::{build_indiacode_index, fetch_and_index, ActCatalog, ActCitation, ActPdfFetcher};
use crate::knowledge::{KnowledgeBase, NewDocument, Source};
use crate::llm::{GeminiClient, LlmClient};
use crate::scraper::{build_judgment_index, JudgmentScraper, JUDGMENTS_CACHE_FILE};
use crate::text::preview;

/// Act PDFs can be several MB; allow more time than a Gemini call
const PDF_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "nyaya-rag")]
#[command(
    version,
    about = "Indian legal research over IndiaCode Acts, Supreme Court judgments and your documents",
    long_about = None
)]
pub struct Cli {
    /// Data directory (default: $NYAYA_RAG_HOME or ~/.nyaya-rag)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the IndiaCode Act index from a scraped JSON file
    Corpus {
        /// Path to the IndiaCode JSON export
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Extract and index PDF, DOCX, text and image files
    Upload {
        /// Files to upload
        files: Vec<PathBuf>,

        /// Folder to upload (recursive)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Skip image files
        #[arg(long)]
        skip_images: bool,

        /// Re-index files whose content has not changed
        #[arg(long)]
        force: bool,
    },

    /// Scrape (or load cached) Supreme Court landmark judgments and index them
    Judgments {
        /// Ignore the cache and scrape again
        #[arg(long)]
        refresh: bool,

        /// First year to scrape
        #[arg(long)]
        start: Option<i32>,

        /// Last year to scrape
        #[arg(long)]
        end: Option<i32>,
    },

    /// Ask a legal question
    Ask {
        /// The question
        question: String,

        /// Passages retrieved per source
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Search the knowledge base without generating an answer
    Search {
        /// Search query
        query: String,

        /// Keyword (FTS5) search; works without an API key
        #[arg(long)]
        keyword: bool,

        /// Restrict to one source (documents, indiacode, judgments)
        #[arg(short, long)]
        source: Option<Source>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Look up IndiaCode Acts
    Acts {
        #[command(subcommand)]
        command: ActsCommand,
    },

    /// List stored documents
    List {
        /// Restrict to one source
        #[arg(short, long)]
        source: Option<Source>,

        /// Maximum number of documents
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete a document and its vectors
    Delete {
        /// Document ID
        #[arg(short, long)]
        id: i64,
    },

    /// Show data directory, API key and index status
    Status,

    /// Check the API key and Gemini connectivity
    Check,
}

#[derive(Subcommand)]
pub enum ActsCommand {
    /// Show IndiaCode Acts matching a name
    Match {
        /// Act name, e.g. "Coinage Act" or "IPC"
        name: String,

        /// Maximum number of candidates
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Download the best match's PDF and index its full text
    Fetch {
        /// Act name
        name: String,

        /// Enactment year, to tell apart Acts with the same name
        #[arg(short, long)]
        year: Option<String>,

        /// Re-index even if the PDF text has not changed
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// Run a parsed command
pub async fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let settings = Settings::load(&data_dir)?;

    match cli.command {
        Commands::Corpus { path } => cmd_corpus(&data_dir, &settings, &path).await,
        Commands::Upload {
            files,
            dir,
            skip_images,
            force,
        } => cmd_upload(&data_dir, &settings, files, dir, skip_images, force).await,
        Commands::Judgments {
            refresh,
            start,
            end,
        } => cmd_judgments(&data_dir, &settings, refresh, start, end).await,
        Commands::Ask { question, top_k } => cmd_ask(&data_dir, &settings, &question, top_k).await,
        Commands::Search {
            query,
            keyword,
            source,
            limit,
        } => cmd_search(&data_dir, &settings, &query, keyword, source, limit).await,
        Commands::Acts { command } => match command {
            ActsCommand::Match { name, limit } => cmd_acts_match(&data_dir, &settings, &name, limit).await,
            ActsCommand::Fetch { name, year, force } => {
                cmd_acts_fetch(&data_dir, &settings, &name, year.as_deref(), force).await
            }
        },
        Commands::List { source, limit } => cmd_list(&data_dir, &settings, source, limit).await,
        Commands::Delete { id } => cmd_delete(&data_dir, &settings, id).await,
        Commands::Status => cmd_status(&data_dir, &settings).await,
        Commands::Check => cmd_check(&settings).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Build the IndiaCode index (corpus)
async fn cmd_corpus(data_dir: &Path, settings: &Settings, path: &Path) -> Result<()> {
    require_api_key()?;
    let kb = open_kb(data_dir, settings).await?;

    println!("[*] Building IndiaCode index from {}", path.display());
    let report = build_indiacode_index(&kb, path).await?;

    println!(
        "[OK] {} Acts: {} indexed, {} unchanged, {} failed, {} removed",
        report.acts, report.indexed, report.unchanged, report.failed, report.pruned
    );
    Ok(())
}

/// Extract and index user files (upload)
///
/// Each file becomes one document keyed by its `file://` URL.
async fn cmd_upload(
    data_dir: &Path,
    settings: &Settings,
    files: Vec<PathBuf>,
    dir: Option<PathBuf>,
    skip_images: bool,
    force: bool,
) -> Result<()> {
    require_api_key()?;

    if files.is_empty() && dir.is_none() {
        bail!("Specify files to upload or --dir <folder>");
    }

    let collector = FileCollector::new(CollectorConfig {
        skip_images,
        ..Default::default()
    });

    let mut collected = collector.collect_paths(&files)?;
    if let Some(ref dir_path) = dir {
        collected.extend(collector.collect_directory(dir_path)?);
    }

    if collected.is_empty() {
        println!("[!] No supported files found.");
        return Ok(());
    }

    let stats = CollectionStats::from_files(&collected);
    println!("[*] Files to upload: {}", stats.total_files);
    println!(
        "    PDF: {}, DOCX: {}, text: {}, images: {}",
        stats.pdf_files, stats.docx_files, stats.text_files, stats.image_files
    );
    println!("    Total size: {}", format_bytes(stats.total_size as usize));
    println!();

    let llm = llm_client(settings)?;
    let extractor = ContentExtractor::new(Some(llm));
    let kb = open_kb(data_dir, settings).await?;

    if stats.image_files > 0 {
        println!(
            "[!] {} image(s) will be OCR'd with Gemini. This makes API calls.",
            stats.image_files
        );
    }

    let mut indexed = 0;
    let mut unchanged = 0;
    let mut failed = 0;

    for (i, file) in collected.iter().enumerate() {
        let name = file.file_name();
        let prefix = format!(
            "[{}/{}] [{}] {}... ",
            i + 1,
            collected.len(),
            file.file_type.label(),
            name
        );
        write_progress(&mut std::io::stdout(), &prefix).ok();

        let content = match extractor.extract(file).await {
            Ok(c) if !c.text.trim().is_empty() => c,
            Ok(_) => {
                println!("no text");
                failed += 1;
                continue;
            }
            Err(e) => {
                println!("failed: {:#}", e);
                failed += 1;
                continue;
            }
        };

        let doc = NewDocument {
            source: Source::Documents,
            url: file.url(),
            title: Some(name),
            content: content.text,
        };

        match kb.index_document(doc, force).await {
            Ok(report) if report.skipped => {
                println!("unchanged (#{})", report.doc_id);
                unchanged += 1;
            }
            Ok(report) => {
                println!("done (#{}, {} chunks)", report.doc_id, report.chunks);
                indexed += 1;
            }
            Err(e) => {
                println!("index failed: {:#}", e);
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "[OK] Done: {} indexed, {} unchanged, {} failed",
        indexed, unchanged, failed
    );
    Ok(())
}

/// Scrape or load judgments and index them (judgments)
async fn cmd_judgments(
    data_dir: &Path,
    settings: &Settings,
    refresh: bool,
    start: Option<i32>,
    end: Option<i32>,
) -> Result<()> {
    require_api_key()?;

    let start = start.unwrap_or(settings.judgment_start_year);
    let end = end.unwrap_or(settings.judgment_end_year);
    if start > end {
        bail!("--start ({}) is after --end ({})", start, end);
    }

    let kb = open_kb(data_dir, settings).await?;
    let scraper = JudgmentScraper::new()?;
    let cache = data_dir.join(JUDGMENTS_CACHE_FILE);

    let outcome = scraper.load_or_scrape(&cache, refresh, start, end).await?;
    println!("[*] Indexing {} judgments...", outcome.judgments.len());
    if !outcome.is_complete() {
        println!("[!] Some years failed; previously indexed judgments are kept.");
    }

    let report = build_judgment_index(&kb, &outcome.judgments, outcome.is_complete()).await?;
    println!(
        "[OK] {} judgments: {} indexed, {} unchanged, {} failed, {} removed",
        report.judgments, report.indexed, report.unchanged, report.failed, report.pruned
    );
    Ok(())
}

/// Answer a question (ask)
async fn cmd_ask(data_dir: &Path, settings: &Settings, question: &str, top_k: Option<usize>) -> Result<()> {
    require_api_key()?;

    let kb = open_kb(data_dir, settings).await?;
    let llm = llm_client(settings)?;

    let retriever = kb.retrieval_agent(top_k.unwrap_or(settings.top_k), &settings.weights)?;
    let summarizer = SummarizerAgent::new(llm.clone(), settings.summary_max_chars);
    let catalog = ActCatalog::from_store(kb.store(), settings.act_match_threshold)?;
    if catalog.is_empty() {
        tracing::debug!("No IndiaCode Acts loaded; answers will have no Act citations");
    }

    let agent = ReasoningAgent::new(llm, retriever, summarizer).with_catalog(catalog);

    println!("[*] Thinking about: \"{}\"", question);
    let answer = agent.run(question).await?;

    if answer.passages.is_empty() {
        println!("[!] No indexed material matched; the answer is based on the model alone.");
    }
    println!();
    println!("{}", answer.render());
    Ok(())
}

/// Retrieval only (search)
async fn cmd_search(
    data_dir: &Path,
    settings: &Settings,
    query: &str,
    keyword: bool,
    source: Option<Source>,
    limit: usize,
) -> Result<()> {
    let kb = open_kb(data_dir, settings).await?;
    println!("[*] Searching: \"{}\"", query);

    if keyword {
        let results = kb.search_keyword(query, limit, source).context("Keyword search failed")?;
        if results.is_empty() {
            println!("\n[!] No results.");
            return Ok(());
        }

        println!("\n[OK] {} result(s):\n", results.len());
        for (i, r) in results.iter().enumerate() {
            println!(
                "{}. [{}] [bm25: {:.4}] Doc #{}",
                i + 1,
                r.source.label(),
                r.bm25_score,
                r.doc_id
            );
            if let Some(ref title) = r.title {
                println!("   Title: {}", title);
            }
            println!("   URL: {}", r.url);
            println!("   Snippet: {}", preview(&r.content_snippet, 200));
            println!();
        }
        return Ok(());
    }

    require_api_key()?;
    let agent = kb.retrieval_agent(limit, &settings.weights)?;
    let mut passages = agent.retrieve_passages(query).await?;
    if let Some(source) = source {
        passages.retain(|p| p.source == source);
    }
    passages.truncate(limit);

    if passages.is_empty() {
        println!("\n[!] No results.");
        return Ok(());
    }

    println!("\n[OK] {} result(s):\n", passages.len());
    for (i, p) in passages.iter().enumerate() {
        println!(
            "{}. [{}] [score: {:.4}, similarity: {:.4}] Doc #{} chunk {}",
            i + 1,
            p.source.label(),
            p.score,
            p.similarity,
            p.doc_id,
            p.chunk_index
        );
        println!("   {}", preview(&p.text, 200));
        println!();
    }
    Ok(())
}

/// Fuzzy Act lookup (acts match)
async fn cmd_acts_match(data_dir: &Path, settings: &Settings, name: &str, limit: usize) -> Result<()> {
    let kb = open_kb(data_dir, settings).await?;
    let catalog = load_catalog(&kb, settings)?;

    let matches = catalog.top_matches(name, limit);
    if matches.is_empty() {
        println!("[!] No Act matches \"{}\"", name);
        return Ok(());
    }

    println!("[OK] {} match(es) for \"{}\":\n", matches.len(), name);
    for (i, m) in matches.iter().enumerate() {
        let year = if m.act.act_year.is_empty() { "-" } else { m.act.act_year.as_str() };
        println!("{}. [{:.2}] {} ({})", i + 1, m.score, m.act.title, year);
        match m.act.pdf_links.first() {
            Some(link) => println!("   PDF: {}", link),
            None => println!("   PDF: -"),
        }
    }
    Ok(())
}

/// Download and index an Act PDF (acts fetch)
async fn cmd_acts_fetch(
    data_dir: &Path,
    settings: &Settings,
    name: &str,
    year: Option<&str>,
    force: bool,
) -> Result<()> {
    require_api_key()?;

    let kb = open_kb(data_dir, settings).await?;
    let catalog = load_catalog(&kb, settings)?;

    let m = catalog
        .best_match(name, year)
        .ok_or_else(|| anyhow::anyhow!("No IndiaCode Act matches \"{}\"", name))?;
    let citation = ActCitation {
        title: m.act.title.clone(),
        year: m.act.act_year.clone(),
        pdf_links: m.act.pdf_links.clone(),
        score: m.score,
    };
    println!("[*] Best match: {} [{:.2}]", citation.title, citation.score);

    let fetcher = ActPdfFetcher::new(PDF_DOWNLOAD_TIMEOUT)?;
    let extractor = ContentExtractor::new(Some(llm_client(settings)?));
    let report = fetch_and_index(&kb, &fetcher, &extractor, &citation, force).await?;

    if report.skipped {
        println!("[OK] Already indexed as document #{}", report.doc_id);
    } else {
        println!(
            "[OK] Indexed as document #{} ({} chunks)",
            report.doc_id, report.chunks
        );
    }
    Ok(())
}

/// List documents (list)
async fn cmd_list(data_dir: &Path, settings: &Settings, source: Option<Source>, limit: usize) -> Result<()> {
    let kb = open_kb(data_dir, settings).await?;
    let docs = kb.list_documents(limit, source).context("Failed to list documents")?;

    if docs.is_empty() {
        println!("[!] No documents stored.");
        return Ok(());
    }

    println!("[OK] {} document(s):\n", docs.len());
    for doc in docs {
        let title = doc
            .title
            .as_deref()
            .map(|t| preview(t, 60))
            .unwrap_or_else(|| "-".to_string());

        println!("  #{:<5} [{}] {}", doc.id, doc.source.label(), title);
        println!("         URL: {}", doc.url);
        println!(
            "         {} | {} chars",
            doc.created_at.format("%Y-%m-%d %H:%M"),
            doc.content.chars().count()
        );
        println!();
    }
    Ok(())
}

/// Delete a document and its vectors (delete)
async fn cmd_delete(data_dir: &Path, settings: &Settings, id: i64) -> Result<()> {
    let kb = open_kb(data_dir, settings).await?;

    if kb.delete_document(id).await.context("Failed to delete document")? {
        println!("[OK] Document #{} deleted", id);
        Ok(())
    } else {
        bail!("Document #{} not found", id)
    }
}

/// System status (status)
async fn cmd_status(data_dir: &Path, settings: &Settings) -> Result<()> {
    println!("nyaya-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] Data directory: {}", data_dir.display());
    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() {
        println!("[*] Config: {}", config_path.display());
    } else {
        println!("[*] Config: defaults ({} not found)", CONFIG_FILE);
    }
    println!("[*] Model: {}", settings.model);

    if has_api_key() {
        println!("[OK] API key: set");
    } else {
        println!("[!] API key: not set");
        println!("    Set: export GEMINI_API_KEY=your-key");
    }

    let kb = match open_kb(data_dir, settings).await {
        Ok(kb) => kb,
        Err(e) => {
            println!("[!] Failed to open knowledge base: {:#}", e);
            return Ok(());
        }
    };

    match kb.stats().await {
        Ok(stats) => {
            println!("[OK] Documents: {}", stats.store.document_count);
            for ((source, docs), (_, vectors)) in stats
                .store
                .documents_by_source
                .iter()
                .zip(&stats.vectors_by_source)
            {
                println!("     {:<10} {} docs, {} chunks", source.as_str(), docs, vectors);
            }
            println!("[OK] IndiaCode Acts: {}", stats.store.act_count);
            println!(
                "     Total content: {}",
                format_bytes(stats.store.total_content_bytes)
            );
            if let Some(embedder) = stats.embedder {
                println!("[*] Embedder: {}", embedder);
            }
        }
        Err(e) => println!("[!] Failed to read stats: {:#}", e),
    }
    Ok(())
}

/// API key and connectivity diagnostic (check)
async fn cmd_check(settings: &Settings) -> Result<()> {
    let key = match get_api_key() {
        Ok(key) => key,
        Err(e) => {
            println!("[!] API key: not found");
            return Err(e);
        }
    };
    println!("[OK] API key: {}", mask_key(&key));

    let client = GeminiClient::from_settings(settings)?;
    println!("[*] Calling {} ...", client.model());

    match client.generate("Say hello").await {
        Ok(reply) => {
            println!("[OK] Gemini responded: {}", preview(&reply, 80));
            Ok(())
        }
        Err(e) => {
            println!("[!] Gemini request failed");
            Err(e.into())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn open_kb(data_dir: &Path, settings: &Settings) -> Result<KnowledgeBase> {
    KnowledgeBase::open(data_dir, settings)
        .await
        .context("Failed to open knowledge base")
}

fn llm_client(settings: &Settings) -> Result<Arc<dyn LlmClient>> {
    let client = GeminiClient::from_settings(settings).context("Failed to create Gemini client")?;
    Ok(Arc::new(client))
}

fn load_catalog(kb: &KnowledgeBase, settings: &Settings) -> Result<ActCatalog> {
    let catalog = ActCatalog::from_store(kb.store(), settings.act_match_threshold)?;
    if catalog.is_empty() {
        bail!("No IndiaCode Acts loaded. Run: nyaya-rag corpus --path <indiacode.json>");
    }
    Ok(catalog)
}

fn require_api_key() -> Result<()> {
    if !has_api_key() {
        bail!(
            "API key not set.\n\n\
             Setup:\n  \
             export GEMINI_API_KEY=your-api-key\n  \
             or\n  \
             export GOOGLE_AI_API_KEY=your-api-key\n\n\
             Get a key at: https://aistudio.google.com/app/apikey"
        );
    }
    Ok(())
}

/// Show only the first few characters of a secret
fn mask_key(key: &str) -> String {
    let shown: String = key.chars().take(6).collect();
    if key.chars().count() <= 6 {
        "*".repeat(key.chars().count())
    } else {
        format!("{}...", shown)
    }
}

/// Progress prefix with no newline, flushed before the step it announces
fn write_progress<W: Write>(out: &mut W, prefix: &str) -> std::io::Result<()> {
    out.write_all(prefix.as_bytes())?;
    out.flush()
}

/// Human-readable byte size
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
