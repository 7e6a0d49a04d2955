//! Analysis settings shared by the store, agents and CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Tunables for one analysis pipeline. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum relevance for the Legal Analyst's local rule to keep a document.
    pub relevance_threshold: f32,
    /// Documents requested from retrieval per feature.
    pub retrieval_limit: usize,
    pub cache_ttl_days: i64,
    pub completion_timeout_secs: u64,
    /// Deadline for all agents of one request.
    pub request_timeout_secs: u64,
    pub completion_model: String,
    /// Base URL of an OpenAI-compatible API (no trailing `/chat/completions`).
    pub completion_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.5,
            retrieval_limit: 10,
            cache_ttl_days: 30,
            completion_timeout_secs: 30,
            request_timeout_secs: 60,
            completion_model: "moonshotai/kimi-k2:free".to_string(),
            completion_url: "https://openrouter.ai/api/v1".to_string(),
            max_tokens: 1000,
            temperature: 0.3,
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
