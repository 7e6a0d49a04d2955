//! Retrieval over the reference corpus.
//!
//! [`RetrievalService`] answers `search(query, limit)` from a LanceDB
//! similarity index when one could be built at startup, and from the
//! [`KeywordIndex`] otherwise. The choice is made once; `search` never fails.

use std::fmt;
#[cfg(feature = "lancedb")]
use std::path::Path;
#[cfg(feature = "lancedb")]
use std::sync::Arc;

use async_trait::async_trait;
use lawgate_core::{ReferenceDocument, RetrievalResult};
#[cfg(feature = "lancedb")]
use lawgate_core::ScoredDocument;
#[cfg(feature = "lancedb")]
use tracing::warn;

use crate::keyword::KeywordIndex;
#[cfg(feature = "lancedb")]
use crate::lance::LanceIndex;

/// Anything the Legal Analyst can pull reference documents from.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `limit` documents, most relevant first. Empty on a blank query,
    /// a zero limit, or any internal failure.
    async fn search(&self, query: &str, limit: usize) -> RetrievalResult;
}

/// Sentence embedder used to index the corpus and embed queries.
pub trait QueryEmbedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    Similarity,
    Keyword,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "lancedb")]
struct SimilarityBackend {
    index: LanceIndex,
    embedder: Arc<dyn QueryEmbedder>,
}

pub struct RetrievalService {
    keyword: KeywordIndex,
    #[cfg(feature = "lancedb")]
    similarity: Option<SimilarityBackend>,
}

impl RetrievalService {
    /// Keyword-only service.
    pub fn keyword(documents: Vec<ReferenceDocument>) -> Self {
        Self {
            keyword: KeywordIndex::new(documents),
            #[cfg(feature = "lancedb")]
            similarity: None,
        }
    }

    /// Similarity service backed by a LanceDB index at `db_path`.
    ///
    /// Falls back to keyword mode for the service's lifetime when the corpus
    /// is empty or the index cannot be opened or built.
    #[cfg(feature = "lancedb")]
    pub async fn similarity(
        documents: Vec<ReferenceDocument>,
        db_path: &Path,
        embedder: Arc<dyn QueryEmbedder>,
    ) -> Self {
        if documents.is_empty() {
            warn!("reference corpus is empty, using keyword retrieval");
            return Self::keyword(documents);
        }
        match LanceIndex::open_or_build(db_path, &documents, embedder.as_ref()).await {
            Ok(index) => Self {
                keyword: KeywordIndex::new(documents),
                similarity: Some(SimilarityBackend { index, embedder }),
            },
            Err(e) => {
                warn!(error = %e, "similarity index unavailable, using keyword retrieval");
                Self::keyword(documents)
            }
        }
    }

    pub fn mode(&self) -> RetrievalMode {
        #[cfg(feature = "lancedb")]
        if self.similarity.is_some() {
            return RetrievalMode::Similarity;
        }
        RetrievalMode::Keyword
    }

    pub fn len(&self) -> usize {
        self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
    }

    pub fn documents(&self) -> &[ReferenceDocument] {
        self.keyword.documents()
    }

    #[cfg(feature = "lancedb")]
    async fn similarity_search(
        &self,
        backend: &SimilarityBackend,
        query: &str,
        limit: usize,
    ) -> RetrievalResult {
        let embedder = Arc::clone(&backend.embedder);
        let text = query.to_string();
        let embedded = tokio::task::spawn_blocking(move || embedder.embed(&[text.as_str()])).await;

        let vector = match embedded {
            Ok(Ok(mut vectors)) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(Ok(_)) => {
                warn!("embedder returned no vector for query");
                return Vec::new();
            }
            Ok(Err(e)) => {
                warn!(error = %e, "query embedding failed");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "query embedding task failed");
                return Vec::new();
            }
        };

        let hits = match backend.index.search(&vector, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "similarity search failed");
                return Vec::new();
            }
        };

        let documents = self.keyword.documents();
        hits.into_iter()
            .filter_map(|(doc_id, distance)| {
                documents.get(doc_id).map(|document| ScoredDocument {
                    document: document.clone(),
                    score: distance_to_score(distance),
                })
            })
            .collect()
    }
}

/// Cosine distance is in `[0, 2]`; map it onto a `[0, 1]` relevance score.
#[cfg(feature = "lancedb")]
fn distance_to_score(distance: f32) -> f32 {
    let score = 1.0 - distance / 2.0;
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

#[async_trait]
impl Retriever for RetrievalService {
    async fn search(&self, query: &str, limit: usize) -> RetrievalResult {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        #[cfg(feature = "lancedb")]
        if let Some(backend) = &self.similarity {
            return self.similarity_search(backend, query, limit).await;
        }
        self.keyword.search(query, limit)
    }
}
