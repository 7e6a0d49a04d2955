//! LanceDB similarity index over the reference corpus.
//!
//! One table, `reference_documents`, holding every corpus document with its
//! embedding. Rows carry the document's corpus position as `doc_id`, so hits
//! resolve against the in-memory corpus rather than being decoded from Arrow.
//! A sha256 fingerprint of the indexed corpus is written next to the table so
//! a corpus edited in place is re-embedded instead of silently mismatched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{
    Array, FixedSizeListBuilder, Float32Array, Float32Builder, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};
use lawgate_core::ReferenceDocument;
use lawgate_core::corpus::{REFERENCE_DOCUMENTS_TABLE, reference_documents_schema};
use tracing::info;

use crate::StoreError;
use crate::corpus::corpus_fingerprint;
use crate::retrieval::QueryEmbedder;

const EMBED_BATCH_SIZE: usize = 64;
const FINGERPRINT_FILE: &str = "reference_documents.sha256";

pub struct IndexStats {
    pub rows: usize,
    pub elapsed_secs: f64,
}

pub struct LanceIndex {
    db: lancedb::Connection,
    path: PathBuf,
}

impl LanceIndex {
    /// Connect to a LanceDB database, creating the directory if needed.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri).execute().await?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Open the index, rebuilding it unless it was built from exactly
    /// `documents`.
    pub async fn open_or_build(
        path: &Path,
        documents: &[ReferenceDocument],
        embedder: &dyn QueryEmbedder,
    ) -> Result<Self, StoreError> {
        let index = Self::open(path).await?;
        if index.is_current(documents).await? {
            info!(rows = documents.len(), "reusing reference document index");
        } else {
            index.rebuild(documents, embedder).await?;
        }
        Ok(index)
    }

    /// True when the table holds one row per document and its recorded
    /// fingerprint matches the corpus.
    pub async fn is_current(&self, documents: &[ReferenceDocument]) -> Result<bool, StoreError> {
        if self.row_count().await? != Some(documents.len()) {
            return Ok(false);
        }
        let stored = match std::fs::read_to_string(self.fingerprint_path()) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let current = corpus_fingerprint(documents);
        if stored.trim() != current {
            info!("reference corpus changed since the index was built");
            return Ok(false);
        }
        Ok(true)
    }

    /// Rows in the table, or `None` when it has not been built.
    pub async fn row_count(&self) -> Result<Option<usize>, StoreError> {
        let names = self.db.table_names().execute().await?;
        if !names.iter().any(|n| n == REFERENCE_DOCUMENTS_TABLE) {
            return Ok(None);
        }
        let table = self.table().await?;
        Ok(Some(table.count_rows(None).await?))
    }

    /// Embed every document and replace the table.
    ///
    /// Embedding runs on the calling thread.
    pub async fn rebuild(
        &self,
        documents: &[ReferenceDocument],
        embedder: &dyn QueryEmbedder,
    ) -> Result<IndexStats, StoreError> {
        if documents.is_empty() {
            return Err(StoreError::Other("cannot index an empty corpus".into()));
        }
        let start = Instant::now();

        let dim = i32::try_from(embedder.dim())
            .map_err(|_| StoreError::Other("embedding dimension out of range".into()))?;
        let schema = Arc::new(reference_documents_schema(dim));

        let mut batches = Vec::new();
        for (chunk_no, chunk) in documents.chunks(EMBED_BATCH_SIZE).enumerate() {
            let texts: Vec<String> = chunk.iter().map(|d| d.search_text()).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let embeddings = embedder
                .embed(&refs)
                .map_err(|e| StoreError::Other(format!("embedding corpus: {e}")))?;
            let first_id = chunk_no * EMBED_BATCH_SIZE;
            batches.push(documents_batch(&schema, first_id, chunk, &embeddings, dim)?);
        }

        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);

        let existing = self.db.table_names().execute().await?;
        if existing.iter().any(|n| n == REFERENCE_DOCUMENTS_TABLE) {
            self.db.drop_table(REFERENCE_DOCUMENTS_TABLE, &[]).await?;
        }
        self.db
            .create_table(REFERENCE_DOCUMENTS_TABLE, Box::new(reader))
            .execute()
            .await?;
        std::fs::create_dir_all(&self.path)?;
        std::fs::write(self.fingerprint_path(), corpus_fingerprint(documents))?;

        let stats = IndexStats {
            rows: documents.len(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            table = REFERENCE_DOCUMENTS_TABLE,
            rows = stats.rows,
            "built reference document index"
        );
        Ok(stats)
    }

    /// Nearest documents to `query_vector` as `(doc_id, cosine distance)`,
    /// closest first.
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<(usize, f32)>, StoreError> {
        let table = self.table().await?;
        let batches: Vec<RecordBatch> = table
            .vector_search(query_vector)?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut hits = Vec::new();
        for batch in &batches {
            let ids = batch
                .column_by_name("doc_id")
                .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
                .ok_or_else(|| StoreError::Other("search result has no doc_id column".into()))?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| StoreError::Other("search result has no _distance column".into()))?;
            for i in 0..batch.num_rows() {
                hits.push((ids.value(i) as usize, distances.value(i)));
            }
        }
        Ok(hits)
    }

    fn fingerprint_path(&self) -> PathBuf {
        self.path.join(FINGERPRINT_FILE)
    }

    async fn table(&self) -> Result<lancedb::Table, StoreError> {
        Ok(self.db.open_table(REFERENCE_DOCUMENTS_TABLE).execute().await?)
    }
}

fn documents_batch(
    schema: &Arc<arrow::datatypes::Schema>,
    first_id: usize,
    documents: &[ReferenceDocument],
    embeddings: &[Vec<f32>],
    dim: i32,
) -> Result<RecordBatch, StoreError> {
    if embeddings.len() != documents.len() {
        return Err(StoreError::Other(format!(
            "embedder returned {} vectors for {} documents",
            embeddings.len(),
            documents.len()
        )));
    }

    let ids = (first_id..first_id + documents.len())
        .map(|i| u32::try_from(i).map_err(|_| StoreError::Other("corpus too large".into())))
        .collect::<Result<Vec<u32>, _>>()?;

    let mut emb_builder = FixedSizeListBuilder::new(Float32Builder::new(), dim);
    for emb in embeddings {
        if emb.len() != dim as usize {
            return Err(StoreError::Other(format!(
                "embedding has {} values, expected {dim}",
                emb.len()
            )));
        }
        emb_builder.values().append_slice(emb);
        emb_builder.append(true);
    }

    let columns: Vec<Arc<dyn Array>> = vec![
        Arc::new(UInt32Array::from(ids)),
        Arc::new(StringArray::from_iter_values(
            documents.iter().map(|d| d.title.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            documents.iter().map(|d| d.body.as_str()),
        )),
        Arc::new(StringArray::from_iter(
            documents.iter().map(|d| d.jurisdiction.as_deref()),
        )),
        Arc::new(StringArray::from_iter_values(
            documents.iter().map(|d| d.content_type.as_str()),
        )),
        Arc::new(emb_builder.finish()),
    ];

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
