//! Knowledge Store - synchronous SQLite document store (rusqlite)
//!
//! Holds the text of every indexed document (uploads, IndiaCode entries,
//! judgment summaries) with an FTS5 mirror for keyword search, plus the
//! IndiaCode Act metadata table used for citation matching.
//!
//! Location: `<data dir>/knowledge.db`

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::indiacode::ActRecord;

// ============================================================================
// Types
// ============================================================================

/// Where an indexed document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// User-uploaded PDF/DOCX/TXT and fetched Act PDFs
    Documents,
    /// IndiaCode statute metadata
    IndiaCode,
    /// Supreme Court landmark judgment summaries
    Judgments,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Documents, Source::IndiaCode, Source::Judgments];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Documents => "documents",
            Source::IndiaCode => "indiacode",
            Source::Judgments => "judgments",
        }
    }

    /// Short label for CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Source::Documents => "DOC",
            Source::IndiaCode => "ACT",
            Source::Judgments => "SCI",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "documents" | "document" | "docs" => Ok(Source::Documents),
            "indiacode" | "acts" | "act" => Ok(Source::IndiaCode),
            "judgments" | "judgment" | "sci" => Ok(Source::Judgments),
            other => anyhow::bail!(
                "Unknown source '{}'. Expected documents, indiacode, or judgments",
                other
            ),
        }
    }
}

/// Stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub source: Source,
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// New document input
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub source: Source,
    /// Stable key (file://..., indiacode://..., sci://..., https://...)
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
    /// Same URL and same content hash
    Unchanged(i64),
}

impl UpsertOutcome {
    pub fn id(&self) -> i64 {
        match *self {
            UpsertOutcome::Inserted(id) | UpsertOutcome::Updated(id) | UpsertOutcome::Unchanged(id) => id,
        }
    }
}

/// FTS5 search hit
#[derive(Debug, Clone)]
pub struct FtsSearchResult {
    pub doc_id: i64,
    pub source: Source,
    pub url: String,
    pub title: Option<String>,
    pub content_snippet: String,
    pub bm25_score: f64,
}

/// Store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub documents_by_source: Vec<(Source, usize)>,
    pub act_count: usize,
    pub total_content_bytes: usize,
    pub db_path: PathBuf,
}

// ============================================================================
// KnowledgeStore
// ============================================================================

/// SQLite document store with FTS5 keyword search
pub struct KnowledgeStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

const DOCUMENT_COLUMNS: &str = "id, source, url, title, content, content_hash, created_at";

impl KnowledgeStore {
    /// Open (or create) the store
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open SQLite database")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_path_buf(),
        };

        store.initialize()?;
        Ok(store)
    }

    /// Open `<data_dir>/knowledge.db`
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        Self::open(&data_dir.join("knowledge.db"))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                title TEXT,
                content TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("Failed to create documents table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source)",
            [],
        )
        .context("Failed to create source index")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS acts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                title TEXT NOT NULL UNIQUE,
                short_title TEXT,
                act_id TEXT,
                act_number TEXT,
                act_year TEXT,
                long_title TEXT,
                enactment_date TEXT,
                enforcement_date TEXT,
                pdf_links TEXT NOT NULL DEFAULT '[]'
            )",
            [],
        )
        .context("Failed to create acts table")?;

        // ref: https://www.sqlite.org/fts5.html
        let fts_result = conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
                title,
                content,
                content=documents,
                content_rowid=id
            )",
            [],
        );

        if let Err(e) = fts_result {
            tracing::warn!("FTS5 not available (optional): {}", e);
        } else {
            let _ = conn.execute_batch(
                r#"
                CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
                    INSERT INTO documents_fts(rowid, title, content)
                    VALUES (new.id, new.title, new.content);
                END;

                CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
                    INSERT INTO documents_fts(documents_fts, rowid, title, content)
                    VALUES('delete', old.id, old.title, old.content);
                END;

                CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
                    INSERT INTO documents_fts(documents_fts, rowid, title, content)
                    VALUES('delete', old.id, old.title, old.content);
                    INSERT INTO documents_fts(rowid, title, content)
                    VALUES (new.id, new.title, new.content);
                END;
                "#,
            );
        }

        tracing::debug!("Knowledge store initialized at {:?}", self.db_path);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    /// Insert or update a document keyed by URL
    ///
    /// The row id is stable across updates, so vectors can be replaced by doc id.
    pub fn upsert_document(&self, doc: &NewDocument) -> Result<UpsertOutcome> {
        let conn = self.lock()?;
        let hash = content_hash(&doc.content);

        let existing: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, content_hash FROM documents WHERE url = ?1",
                params![doc.url],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to look up document")?;

        let now = Utc::now().to_rfc3339();

        match existing {
            Some((id, old_hash)) if old_hash == hash => Ok(UpsertOutcome::Unchanged(id)),
            Some((id, _)) => {
                conn.execute(
                    "UPDATE documents
                     SET source = ?1, title = ?2, content = ?3, content_hash = ?4, created_at = ?5
                     WHERE id = ?6",
                    params![doc.source.as_str(), doc.title, doc.content, hash, now, id],
                )
                .context("Failed to update document")?;
                tracing::debug!("Updated document: {} (id={})", doc.url, id);
                Ok(UpsertOutcome::Updated(id))
            }
            None => {
                conn.execute(
                    "INSERT INTO documents (source, url, title, content, content_hash, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![doc.source.as_str(), doc.url, doc.title, doc.content, hash, now],
                )
                .context("Failed to insert document")?;
                let id = conn.last_insert_rowid();
                tracing::debug!("Inserted document: {} (id={})", doc.url, id);
                Ok(UpsertOutcome::Inserted(id))
            }
        }
    }

    pub fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS);

        conn.query_row(&sql, params![id], row_to_document)
            .optional()
            .context("Failed to get document")
    }

    pub fn get_by_url(&self, url: &str) -> Result<Option<Document>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM documents WHERE url = ?1", DOCUMENT_COLUMNS);

        conn.query_row(&sql, params![url], row_to_document)
            .optional()
            .context("Failed to get document by URL")
    }

    /// Most recent documents, optionally for one source
    pub fn list_documents(&self, limit: usize, source: Option<Source>) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let docs = if let Some(source) = source {
            let sql = format!(
                "SELECT {} FROM documents WHERE source = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
                DOCUMENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![source.as_str(), limit as i64], row_to_document)?;
            rows.filter_map(|r| r.ok()).collect()
        } else {
            let sql = format!(
                "SELECT {} FROM documents ORDER BY created_at DESC, id DESC LIMIT ?1",
                DOCUMENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64], row_to_document)?;
            rows.filter_map(|r| r.ok()).collect()
        };

        Ok(docs)
    }

    /// Ids of every document from a source
    pub fn document_ids(&self, source: Source) -> Result<Vec<i64>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM documents WHERE source = ?1")?;
        let ids = stmt
            .query_map(params![source.as_str()], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }

    pub fn delete_document(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// FTS5 keyword search, BM25 ranked
    ///
    /// ref: https://www.sqlite.org/fts5.html#the_bm25_function
    pub fn search_fts(
        &self,
        query: &str,
        limit: usize,
        source: Option<Source>,
    ) -> Result<Vec<FtsSearchResult>> {
        let conn = self.lock()?;

        let escaped_query = escape_fts5_query(query);
        if escaped_query.is_empty() {
            return Ok(vec![]);
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT
                d.id,
                d.source,
                d.url,
                d.title,
                snippet(documents_fts, 1, '<b>', '</b>', '...', 64) as content_snippet,
                bm25(documents_fts) as bm25_score
            FROM documents_fts
            JOIN documents d ON d.id = documents_fts.rowid
            WHERE documents_fts MATCH ?1
              AND (?2 IS NULL OR d.source = ?2)
            ORDER BY bm25(documents_fts)
            LIMIT ?3
            "#,
        )?;

        let results = stmt
            .query_map(
                params![escaped_query, source.map(|s| s.as_str()), limit as i64],
                |row| {
                    let source: String = row.get(1)?;
                    Ok(FtsSearchResult {
                        doc_id: row.get(0)?,
                        source: parse_source(&source),
                        url: row.get(2)?,
                        title: row.get(3)?,
                        content_snippet: row.get(4)?,
                        bm25_score: row.get(5)?,
                    })
                },
            )?
            .filter_map(|r| r.ok())
            .collect();

        Ok(results)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .unwrap_or(0);

        let total_size: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(LENGTH(content)), 0) FROM documents",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        let act_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM acts", [], |row| row.get(0))
            .unwrap_or(0);

        let mut documents_by_source = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            let n: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM documents WHERE source = ?1",
                    params![source.as_str()],
                    |row| row.get(0),
                )
                .unwrap_or(0);
            documents_by_source.push((source, n as usize));
        }

        Ok(StoreStats {
            document_count: count as usize,
            documents_by_source,
            act_count: act_count as usize,
            total_content_bytes: total_size as usize,
            db_path: self.db_path.clone(),
        })
    }

    // ------------------------------------------------------------------------
    // Acts
    // ------------------------------------------------------------------------

    /// Replace the whole Act metadata table
    pub fn replace_acts(&self, acts: &[ActRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;

        tx.execute("DELETE FROM acts", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO acts (
                    category, title, short_title, act_id, act_number, act_year,
                    long_title, enactment_date, enforcement_date, pdf_links
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for act in acts {
                let links = serde_json::to_string(&act.pdf_links)?;
                stmt.execute(params![
                    act.category,
                    act.title,
                    none_if_empty(&act.short_title),
                    none_if_empty(&act.act_id),
                    none_if_empty(&act.act_number),
                    none_if_empty(&act.act_year),
                    none_if_empty(&act.long_title),
                    none_if_empty(&act.enactment_date),
                    none_if_empty(&act.enforcement_date),
                    links,
                ])?;
            }
        }
        tx.commit().context("Failed to commit acts")?;

        tracing::info!("Stored {} IndiaCode acts", acts.len());
        Ok(acts.len())
    }

    pub fn list_acts(&self) -> Result<Vec<ActRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT category, title, short_title, act_id, act_number, act_year,
                    long_title, enactment_date, enforcement_date, pdf_links
             FROM acts ORDER BY id",
        )?;

        let acts = stmt
            .query_map([], |row| {
                let links: String = row.get(9)?;
                Ok(ActRecord {
                    category: row.get(0)?,
                    title: row.get(1)?,
                    short_title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    act_id: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    act_number: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    act_year: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    long_title: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    enactment_date: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    enforcement_date: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    pdf_links: serde_json::from_str(&links).unwrap_or_default(),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(acts)
    }

    pub fn act_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM acts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let source: String = row.get(1)?;
    Ok(Document {
        id: row.get(0)?,
        source: parse_source(&source),
        url: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        content_hash: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn parse_source(s: &str) -> Source {
    s.parse().unwrap_or(Source::Documents)
}

fn none_if_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// SHA-256 hex digest of document content
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Strip FTS5 operators, keeping only word characters
///
/// ref: https://www.sqlite.org/fts5.html#full_text_query_syntax
fn escape_fts5_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .map(|w| format!("\"{}\"", w))
        .collect::<Vec<_>>()
        .join(" OR ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, KnowledgeStore) {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::open_in(dir.path()).unwrap();
        (dir, store)
    }

    fn new_doc(source: Source, url: &str, content: &str) -> NewDocument {
        NewDocument {
            source,
            url: url.to_string(),
            title: Some(format!("Title of {}", url)),
            content: content.to_string(),
        }
    }

    fn act(title: &str, year: &str) -> ActRecord {
        ActRecord {
            category: "allacts".to_string(),
            title: title.to_string(),
            act_year: year.to_string(),
            pdf_links: vec![format!("https://www.indiacode.nic.in/{}.pdf", year)],
            ..Default::default()
        }
    }

    #[test]
    fn test_source_round_trip_names() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert_eq!("acts".parse::<Source>().unwrap(), Source::IndiaCode);
        assert!("statutes".parse::<Source>().is_err());
    }

    #[test]
    fn test_upsert_insert_update_unchanged() {
        let (_dir, store) = create_test_store();

        let doc = new_doc(Source::Documents, "file:///tmp/a.txt", "first version");
        let first = store.upsert_document(&doc).unwrap();
        assert!(matches!(first, UpsertOutcome::Inserted(_)));

        let again = store.upsert_document(&doc).unwrap();
        assert_eq!(again, UpsertOutcome::Unchanged(first.id()));

        let changed = new_doc(Source::Documents, "file:///tmp/a.txt", "second version");
        let updated = store.upsert_document(&changed).unwrap();
        assert_eq!(updated, UpsertOutcome::Updated(first.id()));

        let stored = store.get_document(first.id()).unwrap().unwrap();
        assert_eq!(stored.content, "second version");
        assert_eq!(stored.content_hash, content_hash("second version"));
    }

    #[test]
    fn test_get_by_url() {
        let (_dir, store) = create_test_store();
        store
            .upsert_document(&new_doc(Source::Judgments, "sci://2019/1", "Case: X"))
            .unwrap();

        let doc = store.get_by_url("sci://2019/1").unwrap().unwrap();
        assert_eq!(doc.source, Source::Judgments);
        assert!(store.get_by_url("sci://2019/2").unwrap().is_none());
    }

    #[test]
    fn test_list_documents_by_source() {
        let (_dir, store) = create_test_store();

        for i in 0..5 {
            let source = if i % 2 == 0 { Source::IndiaCode } else { Source::Judgments };
            store
                .upsert_document(&new_doc(source, &format!("key://{}", i), "content"))
                .unwrap();
        }

        assert_eq!(store.list_documents(10, None).unwrap().len(), 5);
        assert_eq!(store.list_documents(10, Some(Source::IndiaCode)).unwrap().len(), 3);
        assert_eq!(store.list_documents(2, None).unwrap().len(), 2);
        assert_eq!(store.document_ids(Source::Judgments).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_document() {
        let (_dir, store) = create_test_store();
        let id = store
            .upsert_document(&new_doc(Source::Documents, "file:///x", "To be deleted"))
            .unwrap()
            .id();

        assert!(store.delete_document(id).unwrap());
        assert!(store.get_document(id).unwrap().is_none());
        assert!(!store.delete_document(id).unwrap());
    }

    #[test]
    fn test_search_fts_filters_source() {
        let (_dir, store) = create_test_store();
        store
            .upsert_document(&new_doc(
                Source::IndiaCode,
                "indiacode://allacts/ipc",
                "Indian Penal Code punishment for cheating",
            ))
            .unwrap();
        store
            .upsert_document(&new_doc(
                Source::Judgments,
                "sci://2020/4",
                "Appeal concerning cheating and breach of trust",
            ))
            .unwrap();

        let all = store.search_fts("cheating", 10, None).unwrap();
        assert_eq!(all.len(), 2);

        let acts_only = store.search_fts("cheating", 10, Some(Source::IndiaCode)).unwrap();
        assert_eq!(acts_only.len(), 1);
        assert_eq!(acts_only[0].url, "indiacode://allacts/ipc");

        assert!(store.search_fts("   ", 10, None).unwrap().is_empty());
    }

    #[test]
    fn test_stats() {
        let (_dir, store) = create_test_store();
        store
            .upsert_document(&new_doc(Source::Documents, "file:///a", "1234567890"))
            .unwrap();
        store.replace_acts(&[act("The Coinage Act, 2011", "2011")]).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.total_content_bytes, 10);
        assert_eq!(stats.act_count, 1);
        assert!(stats.documents_by_source.contains(&(Source::Documents, 1)));
        assert!(stats.documents_by_source.contains(&(Source::Judgments, 0)));
    }

    #[test]
    fn test_replace_and_list_acts() {
        let (_dir, store) = create_test_store();
        store
            .replace_acts(&[act("The Indian Penal Code", "1860"), act("The Coinage Act, 2011", "2011")])
            .unwrap();
        assert_eq!(store.act_count().unwrap(), 2);

        store.replace_acts(&[act("The Coinage Act, 2011", "2011")]).unwrap();
        let acts = store.list_acts().unwrap();
        assert_eq!(acts.len(), 1);
        assert_eq!(acts[0].title, "The Coinage Act, 2011");
        assert_eq!(acts[0].act_year, "2011");
        assert_eq!(acts[0].pdf_links, vec!["https://www.indiacode.nic.in/2011.pdf"]);
        assert!(acts[0].short_title.is_empty());
    }

    #[test]
    fn test_escape_fts5_query() {
        assert_eq!(escape_fts5_query("hello world"), "\"hello\" OR \"world\"");
        assert_eq!(escape_fts5_query("  "), "");
        assert_eq!(escape_fts5_query("section:420"), "\"section420\"");
        assert_eq!(escape_fts5_query("Article-21"), "\"Article21\"");
    }
}
