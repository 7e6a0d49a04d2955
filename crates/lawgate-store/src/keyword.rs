//! Word-overlap retrieval used when no embedding index is available.

use std::collections::HashSet;

use lawgate_core::{ReferenceDocument, RetrievalResult, ScoredDocument, word_set};

/// In-memory index scoring documents by the share of query words they contain.
pub struct KeywordIndex {
    documents: Vec<ReferenceDocument>,
    words: Vec<HashSet<String>>,
}

impl KeywordIndex {
    pub fn new(documents: Vec<ReferenceDocument>) -> Self {
        let words = documents.iter().map(|d| word_set(&d.search_text())).collect();
        Self { documents, words }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[ReferenceDocument] {
        &self.documents
    }

    /// Score is `|query ∩ doc| / |query|`. Documents sharing no word are left
    /// out; equal scores keep corpus order.
    pub fn search(&self, query: &str, limit: usize) -> RetrievalResult {
        let query_words = word_set(query);
        if query_words.is_empty() || limit == 0 {
            return Vec::new();
        }
        let denom = query_words.len() as f32;

        let mut hits: Vec<(usize, f32)> = self
            .words
            .iter()
            .enumerate()
            .filter_map(|(i, doc_words)| {
                let overlap = query_words.intersection(doc_words).count();
                (overlap > 0).then_some((i, overlap as f32 / denom))
            })
            .collect();

        // sort_by is stable, so ties stay in corpus order.
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(limit);

        hits.into_iter()
            .map(|(i, score)| ScoredDocument {
                document: self.documents[i].clone(),
                score,
            })
            .collect()
    }
}
