//! Reference documents: the statute excerpts and policy clauses retrieval runs over.

use serde::{Deserialize, Serialize};

/// Kind of reference material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[serde(alias = "legal_statute")]
    Statute,
    #[default]
    #[serde(alias = "legal_document")]
    Document,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statute => "statute",
            Self::Document => "document",
        }
    }

    /// Parse a stored label. Anything unrecognised is a plain document.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "statute" | "legal_statute" => Self::Statute,
            _ => Self::Document,
        }
    }
}

/// A unit of retrievable context.
///
/// Loaded once with the corpus and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDocument {
    pub title: String,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, alias = "content_type")]
    pub content_type: ContentType,
}

impl ReferenceDocument {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            jurisdiction: None,
            content_type: ContentType::Document,
        }
    }

    pub fn statute(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Statute,
            ..Self::new(title, body)
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Title and body as one string: the text both retrieval modes index.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }

    /// First `max_chars` characters of the body, with an ellipsis when cut.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut chars = self.body.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// One retrieval hit. `score` is in `[0, 1]`, higher is more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: ReferenceDocument,
    pub score: f32,
}

/// Ordered retrieval hits, best first.
pub type RetrievalResult = Vec<ScoredDocument>;
