//! The text-completion collaborator.
//!
//! The pipeline treats completion as opaque: it sends a prompt plus optional
//! structured context and gets back either a JSON object or free text.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion service unavailable: {0}")]
    Unavailable(String),
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("completion timed out after {0}s")]
    Timeout(u64),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("completion response had no content")]
    EmptyResponse,
}

/// A completion reply, classified once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The reply contained a JSON object.
    Structured(Value),
    /// Anything else, kept verbatim.
    Raw(String),
}

impl Reply {
    /// Classify reply text. Models often wrap JSON in prose or code fences,
    /// so the span from the first `{` to the last `}` is tried as well.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return Self::Structured(value);
        }
        if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
            && start < end
            && let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&trimmed[start..=end])
        {
            return Self::Structured(value);
        }
        Self::Raw(text.to_string())
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Model identifier, for logs.
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str, context: Option<&Value>) -> Result<Reply, CompletionError>;
}
