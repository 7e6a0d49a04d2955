//! Embedding pipeline: loads the ONNX model, embeds the corpus, writes LanceDB.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use lawgate_ai::Embedder;
use lawgate_core::ReferenceDocument;
use lawgate_store::{IndexStats, LanceIndex, QueryEmbedder};

/// Shares one ONNX session between the indexer and concurrent queries.
pub struct OnnxQueryEmbedder {
    inner: Mutex<Embedder>,
    dim: usize,
}

impl OnnxQueryEmbedder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let embedder = Embedder::load(model_dir)
            .with_context(|| format!("loading embedding model from {}", model_dir.display()))?;
        Ok(Self {
            dim: embedder.dim(),
            inner: Mutex::new(embedder),
        })
    }
}

impl QueryEmbedder for OnnxQueryEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut embedder = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding model lock poisoned"))?;
        embedder.embed_batch(texts)
    }
}

/// Rebuild the similarity index from `documents`, replacing any existing table.
pub async fn run_index(
    documents: &[ReferenceDocument],
    index_dir: &Path,
    model_dir: &Path,
) -> anyhow::Result<IndexStats> {
    anyhow::ensure!(!documents.is_empty(), "corpus is empty, nothing to index");
    let embedder = OnnxQueryEmbedder::load(model_dir)?;
    eprintln!(
        "  Embedding {} documents ({} dimensions)...",
        documents.len(),
        embedder.dim()
    );

    let index = LanceIndex::open(index_dir)
        .await
        .with_context(|| format!("opening LanceDB at {}", index_dir.display()))?;
    let stats = index
        .rebuild(documents, &embedder)
        .await
        .context("writing reference documents to LanceDB")?;
    Ok(stats)
}
