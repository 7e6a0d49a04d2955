//! Partial findings produced by the analysis agents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the agent that produced a finding.
///
/// Consolidation looks findings up by kind, never by position, so the merge
/// is independent of completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    IntentClassifier,
    LegalAnalyst,
    TechnicalAnalyst,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentClassifier => "intent_classifier",
            Self::LegalAnalyst => "legal_analyst",
            Self::TechnicalAnalyst => "technical_analyst",
        }
    }

    /// Human-facing name used in reasoning lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IntentClassifier => "Intent Classifier",
            Self::LegalAnalyst => "Legal Analyst",
            Self::TechnicalAnalyst => "Technical Analyst",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Compliance risk tier. Ordered by severity; `Unknown` sorts lowest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Unknown,
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse a free-form label such as `"High"`, `"critical"` or `"minimal"`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "severe" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" | "minimal" | "none" => Some(Self::Low),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Bucket a `[0, 1]` risk score: above 0.8 is high, above 0.5 medium.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Self::High
        } else if score > 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regulation an agent believes applies to the feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationEntry {
    pub name: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl RegulationEntry {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
            relevance: None,
            jurisdiction: None,
            risk: None,
            requirements: Vec::new(),
            excerpt: None,
        }
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }
}

/// Intent label assigned by the Intent Classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Compliance,
    Business,
    Ambiguous,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Business => "business",
            Self::Ambiguous => "ambiguous",
        }
    }
}

/// Normalised intent scores; the three values sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentScores {
    pub compliance: f32,
    pub business: f32,
    pub ambiguous: f32,
}

impl IntentScores {
    /// Arg-max label and its score. Ties resolve compliance, business, ambiguous.
    pub fn primary(&self) -> (Intent, f32) {
        let mut best = (Intent::Compliance, self.compliance);
        for candidate in [
            (Intent::Business, self.business),
            (Intent::Ambiguous, self.ambiguous),
        ] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAssessment {
    pub intent: Intent,
    pub scores: IntentScores,
    /// Feature text with known abbreviations spelled out.
    pub expanded_description: String,
    pub jargon: Vec<String>,
    pub geographic_scope: Vec<String>,
    /// Compliance categories with a non-zero score, in table order.
    pub categories: Vec<(String, f32)>,
}

/// Where the Legal Analyst's regulations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalSource {
    /// Parsed from a structured completion reply.
    Structured,
    /// Keyword-scanned from a free-text completion reply.
    RawText,
    /// Local relevance rule over retrieved documents.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalAssessment {
    pub risk_level: RiskLevel,
    pub source: LegalSource,
    pub documents_considered: usize,
    #[serde(default)]
    pub cached: bool,
}

/// Implementation complexity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAssessment {
    pub complexity: Complexity,
    /// Tier terms that drove the complexity decision.
    pub requirements: Vec<String>,
    pub integration_points: Vec<String>,
    pub data_flows: Vec<String>,
    pub security_considerations: Vec<String>,
}

/// Agent-specific part of a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingPayload {
    Intent(IntentAssessment),
    Legal(LegalAssessment),
    Technical(TechnicalAssessment),
    /// Placeholder for an agent that errored, panicked or timed out.
    Failed { error: String },
}

/// Output of one agent for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFinding {
    pub agent: AgentKind,
    pub confidence: f32,
    pub reasoning: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regulations: Vec<RegulationEntry>,
    pub payload: FindingPayload,
}

impl AgentFinding {
    /// New finding; `confidence` is clamped to `[0, 1]`.
    pub fn new(agent: AgentKind, confidence: f32, payload: FindingPayload) -> Self {
        Self {
            agent,
            confidence: clamp_unit(confidence),
            reasoning: Vec::new(),
            regulations: Vec::new(),
            payload,
        }
    }

    /// Placeholder finding for an agent that did not complete.
    pub fn failed(agent: AgentKind, error: impl fmt::Display) -> Self {
        let error = error.to_string();
        Self {
            agent,
            confidence: 0.0,
            reasoning: vec![format!("{agent} failed: {error}")],
            regulations: Vec::new(),
            payload: FindingPayload::Failed { error },
        }
    }

    pub fn with_reasoning(mut self, line: impl Into<String>) -> Self {
        self.reasoning.push(line.into());
        self
    }

    pub fn with_regulations(mut self, regulations: Vec<RegulationEntry>) -> Self {
        self.regulations = regulations;
        self
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.payload, FindingPayload::Failed { .. })
    }

    pub fn intent(&self) -> Option<&IntentAssessment> {
        match &self.payload {
            FindingPayload::Intent(a) => Some(a),
            _ => None,
        }
    }

    pub fn legal(&self) -> Option<&LegalAssessment> {
        match &self.payload {
            FindingPayload::Legal(a) => Some(a),
            _ => None,
        }
    }

    pub fn technical(&self) -> Option<&TechnicalAssessment> {
        match &self.payload {
            FindingPayload::Technical(a) => Some(a),
            _ => None,
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(c: f32, b: f32, a: f32) -> IntentScores {
        IntentScores {
            compliance: c,
            business: b,
            ambiguous: a,
        }
    }

    #[test]
    fn primary_picks_highest_score() {
        assert_eq!(scores(0.2, 0.7, 0.1).primary(), (Intent::Business, 0.7));
        assert_eq!(scores(0.0, 0.0, 1.0).primary(), (Intent::Ambiguous, 1.0));
    }

    #[test]
    fn primary_ties_prefer_compliance() {
        assert_eq!(scores(0.5, 0.5, 0.0).primary().0, Intent::Compliance);
        assert_eq!(scores(0.0, 0.5, 0.5).primary().0, Intent::Business);
    }

    #[test]
    fn risk_level_orders_by_severity() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert!(RiskLevel::Low > RiskLevel::Unknown);
        assert_eq!(
            [RiskLevel::Low, RiskLevel::High, RiskLevel::Medium]
                .into_iter()
                .max(),
            Some(RiskLevel::High)
        );
    }

    #[test]
    fn risk_level_parsing() {
        assert_eq!(RiskLevel::from_label("Critical"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_label(" moderate "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_label("banana"), None);
        assert_eq!(RiskLevel::from_score(0.81), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::Low);
    }

    #[test]
    fn failed_finding_has_zero_confidence() {
        let f = AgentFinding::failed(AgentKind::LegalAnalyst, "connection refused");
        assert!(f.is_failed());
        assert_eq!(f.confidence, 0.0);
        assert_eq!(f.reasoning, ["Legal Analyst failed: connection refused"]);
        assert!(f.legal().is_none());
    }

    #[test]
    fn new_clamps_confidence() {
        let payload = FindingPayload::Failed { error: String::new() };
        assert_eq!(AgentFinding::new(AgentKind::IntentClassifier, 1.7, payload.clone()).confidence, 1.0);
        assert_eq!(AgentFinding::new(AgentKind::IntentClassifier, -0.2, payload.clone()).confidence, 0.0);
        assert_eq!(AgentFinding::new(AgentKind::IntentClassifier, f32::NAN, payload).confidence, 0.0);
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let f = AgentFinding::new(
            AgentKind::LegalAnalyst,
            0.5,
            FindingPayload::Legal(LegalAssessment {
                risk_level: RiskLevel::Medium,
                source: LegalSource::Heuristic,
                documents_considered: 3,
                cached: false,
            }),
        );
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["agent"], "legal_analyst");
        assert_eq!(json["payload"]["kind"], "legal");
        assert_eq!(json["payload"]["risk_level"], "medium");
        let back: AgentFinding = serde_json::from_value(json).unwrap();
        assert_eq!(back, f);
    }
}
