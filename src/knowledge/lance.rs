//! LanceDB Vector Store
//!
//! All source tables live in one `<data dir>/vectors.lance` directory; each
//! [`LanceVectorStore`] is bound to one table.
//! ref: https://lancedb.github.io/lancedb/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, Int64Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::table::Table;

use super::vector::{distance_to_similarity, SearchResult, VectorEntry, VectorStore};

// ============================================================================
// LanceVectorStore
// ============================================================================

/// LanceDB-backed [`VectorStore`] for a single table
pub struct LanceVectorStore {
    db: Connection,
    table_name: String,
}

impl LanceVectorStore {
    /// Connect to the `.lance` directory at `path` and bind to `table_name`
    ///
    /// The table itself is created lazily on first insert.
    pub async fn open(path: &Path, table_name: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create LanceDB directory")?;
            }
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        Ok(Self {
            db,
            table_name: table_name.to_string(),
        })
    }

    fn create_schema(dimension: i32) -> Schema {
        Schema::new(vec![
            Field::new("doc_id", DataType::Int64, false),
            Field::new("chunk_index", DataType::Int32, false),
            Field::new("chunk_text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension,
                ),
                false,
            ),
        ])
    }

    /// Entries -> Arrow RecordBatch; every embedding must share one dimension
    fn entries_to_batch(entries: &[VectorEntry]) -> Result<RecordBatch> {
        let first = entries
            .first()
            .ok_or_else(|| anyhow::anyhow!("Cannot create batch from empty entries"))?;
        let dimension = first.embedding.len();
        if dimension == 0 {
            anyhow::bail!("Embedding for doc {} is empty", first.doc_id);
        }
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            anyhow::bail!(
                "Embedding dimension mismatch for doc {} chunk {}: expected {}, got {}",
                bad.doc_id,
                bad.chunk_index,
                dimension,
                bad.embedding.len()
            );
        }
        let dimension = i32::try_from(dimension).context("Embedding dimension too large")?;

        let doc_ids: Vec<i64> = entries.iter().map(|e| e.doc_id).collect();
        let chunk_indices: Vec<i32> = entries.iter().map(|e| e.chunk_index).collect();
        let chunk_texts: Vec<&str> = entries.iter().map(|e| e.chunk_text.as_str()).collect();

        let embeddings_flat: Vec<f32> = entries
            .iter()
            .flat_map(|e| e.embedding.iter().copied())
            .collect();

        let values = Float32Array::from(embeddings_flat);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings_list = FixedSizeListArray::try_new(
            field,
            dimension,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )
        .context("Failed to create embedding array")?;

        RecordBatch::try_new(
            Arc::new(Self::create_schema(dimension)),
            vec![
                Arc::new(Int64Array::from(doc_ids)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(StringArray::from(chunk_texts)),
                Arc::new(embeddings_list),
            ],
        )
        .context("Failed to create RecordBatch")
    }

    async fn table_exists(&self) -> bool {
        self.db
            .table_names()
            .execute()
            .await
            .map(|names| names.iter().any(|n| n == &self.table_name))
            .unwrap_or(false)
    }

    /// Open the table if it exists
    async fn open_table(&self) -> Result<Option<Table>> {
        if !self.table_exists().await {
            return Ok(None);
        }
        let table = self
            .db
            .open_table(&self.table_name)
            .execute()
            .await
            .with_context(|| format!("Failed to open table '{}'", self.table_name))?;
        Ok(Some(table))
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn insert_batch(&self, entries: &[VectorEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let batch = Self::entries_to_batch(entries)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        match self.open_table().await? {
            Some(table) => {
                table
                    .add(batches)
                    .execute()
                    .await
                    .context("Failed to add vectors to table")?;
            }
            None => {
                self.db
                    .create_table(&self.table_name, batches)
                    .execute()
                    .await
                    .with_context(|| format!("Failed to create table '{}'", self.table_name))?;
            }
        }

        tracing::debug!("Inserted {} vectors into '{}'", entries.len(), self.table_name);
        Ok(entries.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let Some(table) = self.open_table().await? else {
            return Ok(vec![]);
        };

        let results = table
            .vector_search(query_embedding.to_vec())
            .context("Failed to create vector search")?
            .limit(limit)
            .execute()
            .await
            .context("Failed to execute vector search")?;

        let batches: Vec<RecordBatch> = results.try_collect().await?;
        let mut search_results = Vec::new();

        for batch in batches {
            let doc_ids = batch
                .column_by_name("doc_id")
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                .ok_or_else(|| anyhow::anyhow!("Missing doc_id column"))?;

            let chunk_indices = batch
                .column_by_name("chunk_index")
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| anyhow::anyhow!("Missing chunk_index column"))?;

            let chunk_texts = batch
                .column_by_name("chunk_text")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow::anyhow!("Missing chunk_text column"))?;

            // added by LanceDB
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow::anyhow!("Missing _distance column"))?;

            for i in 0..batch.num_rows() {
                search_results.push(SearchResult {
                    doc_id: doc_ids.value(i),
                    chunk_index: chunk_indices.value(i),
                    chunk_text: chunk_texts.value(i).to_string(),
                    similarity: distance_to_similarity(distances.value(i)),
                });
            }
        }

        search_results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(search_results)
    }

    async fn delete_by_doc_id(&self, doc_id: i64) -> Result<usize> {
        let Some(table) = self.open_table().await? else {
            return Ok(0);
        };

        // doc_id is an i64, so the filter cannot carry injected SQL
        let filter = format!("doc_id = {}", doc_id);
        let before = table
            .count_rows(Some(filter.clone()))
            .await
            .context("Failed to count rows for doc_id")?;

        if before > 0 {
            table
                .delete(&filter)
                .await
                .context("Failed to delete vectors")?;
        }
        Ok(before)
    }

    async fn count(&self) -> Result<usize> {
        let Some(table) = self.open_table().await? else {
            return Ok(0);
        };
        table.count_rows(None).await.context("Failed to count rows")
    }

    async fn has_embeddings(&self, doc_id: i64) -> Result<bool> {
        let Some(table) = self.open_table().await? else {
            return Ok(false);
        };

        let filter = format!("doc_id = {}", doc_id);
        let count = table
            .count_rows(Some(filter))
            .await
            .context("Failed to count rows for doc_id")?;

        Ok(count > 0)
    }

    fn name(&self) -> &str {
        &self.table_name
    }
}

// ============================================================================
// Tests
// ============================================================================
