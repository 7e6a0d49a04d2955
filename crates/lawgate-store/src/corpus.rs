//! Reference corpus loading.
//!
//! A corpus file is JSON: either a bare array of documents or an object with
//! a `documents` array. Each document needs a title and some text, given as
//! `body`, `content`, or a list of `sections` with their own titles and
//! content.

use std::path::Path;

use lawgate_core::{ContentType, ReferenceDocument};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::StoreError;

/// Longest section text kept per section. Longer sections are cut with "...".
const MAX_SECTION_CHARS: usize = 5000;

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { documents: Vec<RawDocument> },
    List(Vec<RawDocument>),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawDocument {
    title: String,
    #[serde(alias = "content")]
    body: Option<String>,
    description: Option<String>,
    sections: Vec<RawSection>,
    jurisdiction: Option<String>,
    #[serde(alias = "contentType")]
    content_type: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSection {
    title: Option<String>,
    content: Option<String>,
}

impl RawDocument {
    fn into_document(self) -> Option<ReferenceDocument> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            parts.push(description);
        }
        match self.body {
            Some(body) => parts.push(truncate(&body)),
            None => {
                for section in self.sections {
                    parts.extend(section.title);
                    parts.extend(section.content.map(|c| truncate(&c)));
                }
            }
        }

        let body = parts.join(" ");
        if self.title.trim().is_empty() && body.trim().is_empty() {
            return None;
        }

        Some(ReferenceDocument {
            title: self.title,
            body,
            jurisdiction: self.jurisdiction.filter(|j| !j.trim().is_empty()),
            content_type: self
                .content_type
                .as_deref()
                .map(ContentType::from_label)
                .unwrap_or_default(),
        })
    }
}

fn truncate(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_SECTION_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Load a corpus file. An empty document list is valid.
pub fn load_corpus(path: &Path) -> Result<Vec<ReferenceDocument>, StoreError> {
    if !path.exists() {
        return Err(StoreError::CorpusNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let documents = parse_corpus(&raw)?;
    info!(path = %path.display(), count = documents.len(), "loaded reference corpus");
    Ok(documents)
}

/// Parse corpus JSON, skipping documents with neither title nor text.
pub fn parse_corpus(raw: &str) -> Result<Vec<ReferenceDocument>, StoreError> {
    let raw_docs = match serde_json::from_str::<CorpusFile>(raw)? {
        CorpusFile::Wrapped { documents } => documents,
        CorpusFile::List(documents) => documents,
    };

    let total = raw_docs.len();
    let documents: Vec<ReferenceDocument> = raw_docs
        .into_iter()
        .filter_map(RawDocument::into_document)
        .collect();

    if documents.len() < total {
        warn!(skipped = total - documents.len(), "skipped empty corpus documents");
    }
    Ok(documents)
}

/// Hex sha256 over every document's title, body, jurisdiction and content
/// type, in corpus order. Changes whenever an index built from the corpus
/// would resolve a position to a different document.
pub fn corpus_fingerprint(documents: &[ReferenceDocument]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        for field in [
            doc.title.as_str(),
            doc.body.as_str(),
            doc.jurisdiction.as_deref().unwrap_or(""),
            doc.content_type.as_str(),
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}
