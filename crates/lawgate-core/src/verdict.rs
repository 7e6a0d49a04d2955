//! The consolidated result of one analysis request.
//!
//! Field names serialise in camelCase (`needsComplianceLogic`, `riskLevel`,
//! `actionRequired`, ...) and are the stable contract for anything that
//! renders or forwards a verdict.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finding::{AgentFinding, RegulationEntry, RiskLevel};

/// What the feature owner has to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRequired {
    NoAction,
    Monitor,
    ReviewRequired,
    ImplementCompliance,
    HumanReview,
}

impl ActionRequired {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "no_action",
            Self::Monitor => "monitor",
            Self::ReviewRequired => "review_required",
            Self::ImplementCompliance => "implement_compliance",
            Self::HumanReview => "human_review",
        }
    }
}

impl fmt::Display for ActionRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub feature_id: String,
    pub feature_name: String,
    pub needs_compliance_logic: bool,
    pub confidence: f32,
    pub risk_level: RiskLevel,
    pub action_required: ActionRequired,
    /// Deduplicated by name, in first-seen order across agents.
    pub applicable_regulations: Vec<RegulationEntry>,
    pub human_review_needed: bool,
    pub reasoning: Vec<String>,
    /// Mean confidence across all agents, failed ones included.
    pub agent_consensus: f32,
    pub successful_agents: usize,
    pub total_agents: usize,
    #[serde(default)]
    pub implementation_notes: Vec<String>,
    /// Per-agent findings, kept as an audit trail.
    #[serde(default)]
    pub findings: Vec<AgentFinding>,
    pub analyzed_at: DateTime<Utc>,
}

impl Verdict {
    /// Verdict for a request the pipeline could not analyse at all.
    ///
    /// Risk is `unknown` and the feature goes straight to a human.
    pub fn undetermined(
        feature_id: impl Into<String>,
        feature_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            feature_id: feature_id.into(),
            feature_name: feature_name.into(),
            needs_compliance_logic: false,
            confidence: 0.0,
            risk_level: RiskLevel::Unknown,
            action_required: ActionRequired::HumanReview,
            applicable_regulations: Vec::new(),
            human_review_needed: true,
            reasoning: vec![format!("Analysis failed: {}", reason.into())],
            agent_consensus: 0.0,
            successful_agents: 0,
            total_agents: 0,
            implementation_notes: Vec::new(),
            findings: Vec::new(),
            analyzed_at: Utc::now(),
        }
    }

    /// Names of the applicable regulations, in verdict order.
    pub fn regulation_names(&self) -> Vec<&str> {
        self.applicable_regulations
            .iter()
            .map(|r| r.name.as_str())
            .collect()
    }
}
