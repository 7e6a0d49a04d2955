//! The subject under analysis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A software feature submitted for compliance analysis.
///
/// Accepts `featureName` / `feature_name` as aliases for `name` so feature
/// lists exported by older tooling load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default = "generate_id")]
    pub id: String,
    #[serde(default, alias = "featureName", alias = "feature_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    #[error("feature name is empty")]
    MissingName,
    #[error("feature description is empty")]
    MissingDescription,
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Feature {
    /// New feature with a generated id.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: description.into(),
            code: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Name and description as one sentence-separated string.
    pub fn full_text(&self) -> String {
        format!("{}. {}", self.name.trim(), self.description.trim())
    }

    /// Reject features the pipeline cannot analyse.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.name.trim().is_empty() {
            return Err(FeatureError::MissingName);
        }
        if self.description.trim().is_empty() {
            return Err(FeatureError::MissingDescription);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_distinct_ids() {
        let a = Feature::new("a", "d");
        let b = Feature::new("a", "d");
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn deserialize_generates_missing_id() {
        let f: Feature =
            serde_json::from_str(r#"{"featureName": "Dark Mode", "description": "theme"}"#)
                .unwrap();
        assert_eq!(f.name, "Dark Mode");
        assert!(!f.id.is_empty());
        assert!(f.code.is_none());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert_eq!(
            Feature::new("  ", "desc").validate(),
            Err(FeatureError::MissingName)
        );
        assert_eq!(
            Feature::new("name", "\n").validate(),
            Err(FeatureError::MissingDescription)
        );
        assert!(Feature::new("name", "desc").validate().is_ok());
    }

    #[test]
    fn full_text_joins_name_and_description() {
        let f = Feature::new(" Age Gate ", "users under 16 ");
        assert_eq!(f.full_text(), "Age Gate. users under 16");
    }
}
