//! Merge per-agent findings into one [`Verdict`].
//!
//! Rules, in order:
//! 1. an ambiguous intent goes to a human
//! 2. a compliance intent or any regulation means compliance logic is needed,
//!    at the Legal Analyst's risk level
//! 3. confidence is the strongest positive signal, else the consensus
//! 4. consensus below 0.5, or any failed agent, goes to a human
//! 5. the action follows from review, risk and need; high risk always
//!    flags human review without changing the action

use std::collections::HashSet;

use chrono::Utc;
use lawgate_core::{
    ActionRequired, AgentFinding, Feature, Intent, RegulationEntry, RiskLevel, Verdict,
};

const CONSENSUS_FLOOR: f32 = 0.5;

pub fn consolidate(feature: &Feature, findings: Vec<AgentFinding>, successful: usize) -> Verdict {
    let intent = findings.iter().find_map(|f| f.intent()).map(|a| a.intent);
    let legal_risk = findings.iter().find_map(|f| f.legal()).map(|a| a.risk_level);
    let any_failed = findings.iter().any(AgentFinding::is_failed);

    let regulations = dedup_regulations(&findings);
    let needs_compliance_logic = intent == Some(Intent::Compliance) || !regulations.is_empty();
    let risk_level = if needs_compliance_logic {
        legal_risk.unwrap_or(RiskLevel::Low)
    } else {
        RiskLevel::Low
    };

    let agent_consensus = if findings.is_empty() {
        0.0
    } else {
        findings.iter().map(|f| f.confidence).sum::<f32>() / findings.len() as f32
    };
    let confidence = findings
        .iter()
        .filter(|f| is_positive_signal(f))
        .map(|f| f.confidence)
        .reduce(f32::max)
        .unwrap_or(agent_consensus);

    let mut human_review_needed =
        intent == Some(Intent::Ambiguous) || agent_consensus < CONSENSUS_FLOOR || any_failed;

    let action_required = if human_review_needed {
        ActionRequired::HumanReview
    } else if risk_level == RiskLevel::High {
        ActionRequired::ImplementCompliance
    } else if needs_compliance_logic {
        match risk_level {
            RiskLevel::Medium => ActionRequired::ReviewRequired,
            _ => ActionRequired::Monitor,
        }
    } else {
        ActionRequired::NoAction
    };
    if risk_level == RiskLevel::High {
        human_review_needed = true;
    }

    let mut reasoning = vec![format!(
        "Consensus {agent_consensus:.2} from {successful}/{} agents; {}",
        findings.len(),
        if needs_compliance_logic {
            "compliance logic required"
        } else {
            "no compliance logic required"
        }
    )];
    for finding in &findings {
        if finding.is_failed() {
            reasoning.extend(finding.reasoning.iter().cloned());
        } else {
            let name = finding.agent.display_name();
            reasoning.extend(finding.reasoning.iter().map(|line| format!("[{name}] {line}")));
        }
    }

    Verdict {
        feature_id: feature.id.clone(),
        feature_name: feature.name.clone(),
        needs_compliance_logic,
        confidence,
        risk_level,
        action_required,
        applicable_regulations: regulations,
        human_review_needed,
        reasoning,
        agent_consensus,
        successful_agents: successful,
        total_agents: findings.len(),
        implementation_notes: implementation_notes(&findings),
        findings,
        analyzed_at: Utc::now(),
    }
}

/// A non-ambiguous intent, or any finding that names regulations.
fn is_positive_signal(finding: &AgentFinding) -> bool {
    if finding.is_failed() {
        return false;
    }
    let decisive_intent = finding
        .intent()
        .is_some_and(|a| a.intent != Intent::Ambiguous);
    decisive_intent || !finding.regulations.is_empty()
}

/// Case-insensitive by name, first occurrence wins.
fn dedup_regulations(findings: &[AgentFinding]) -> Vec<RegulationEntry> {
    let mut seen = HashSet::new();
    findings
        .iter()
        .flat_map(|f| &f.regulations)
        .filter(|r| seen.insert(r.name.trim().to_lowercase()))
        .cloned()
        .collect()
}

fn implementation_notes(findings: &[AgentFinding]) -> Vec<String> {
    let Some(tech) = findings.iter().find_map(|f| f.technical()) else {
        return Vec::new();
    };
    let mut notes = vec![format!("Technical complexity: {}", tech.complexity.as_str())];
    if !tech.security_considerations.is_empty() {
        notes.push(format!(
            "Security considerations: {}",
            tech.security_considerations.join(", ")
        ));
    }
    if !tech.integration_points.is_empty() {
        notes.push(format!("Integration points: {}", tech.integration_points.join(", ")));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawgate_core::{
        AgentKind, Complexity, FindingPayload, IntentAssessment, IntentScores, LegalAssessment,
        LegalSource, TechnicalAssessment,
    };

    fn feature() -> Feature {
        Feature::new("Feature", "A feature description.")
    }

    fn intent(label: Intent, confidence: f32) -> AgentFinding {
        let scores = match label {
            Intent::Compliance => IntentScores { compliance: confidence, business: 1.0 - confidence, ambiguous: 0.0 },
            Intent::Business => IntentScores { compliance: 1.0 - confidence, business: confidence, ambiguous: 0.0 },
            Intent::Ambiguous => IntentScores { compliance: 0.0, business: 1.0 - confidence, ambiguous: confidence },
        };
        AgentFinding::new(
            AgentKind::IntentClassifier,
            confidence,
            FindingPayload::Intent(IntentAssessment {
                intent: label,
                scores,
                expanded_description: String::new(),
                jargon: Vec::new(),
                geographic_scope: Vec::new(),
                categories: Vec::new(),
            }),
        )
        .with_reasoning(format!("Primary intent: {}", label.as_str()))
    }

    fn legal(risk: RiskLevel, confidence: f32, names: &[&str]) -> AgentFinding {
        AgentFinding::new(
            AgentKind::LegalAnalyst,
            confidence,
            FindingPayload::Legal(LegalAssessment {
                risk_level: risk,
                source: LegalSource::Heuristic,
                documents_considered: names.len(),
                cached: false,
            }),
        )
        .with_regulations(
            names
                .iter()
                .map(|n| RegulationEntry::new(*n, "test").with_risk(risk))
                .collect(),
        )
    }

    fn technical(confidence: f32) -> AgentFinding {
        AgentFinding::new(
            AgentKind::TechnicalAnalyst,
            confidence,
            FindingPayload::Technical(TechnicalAssessment {
                complexity: Complexity::Medium,
                requirements: vec!["api".into()],
                integration_points: vec!["user_service".into()],
                data_flows: Vec::new(),
                security_considerations: vec!["authentication".into()],
            }),
        )
        .with_reasoning("Complexity: medium")
    }

    #[test]
    fn compliance_with_medium_risk_needs_review() {
        let v = consolidate(
            &feature(),
            vec![intent(Intent::Compliance, 1.0), legal(RiskLevel::Medium, 0.75, &["COPPA"]), technical(0.73)],
            3,
        );
        assert!(v.needs_compliance_logic);
        assert_eq!(v.risk_level, RiskLevel::Medium);
        assert_eq!(v.action_required, ActionRequired::ReviewRequired);
        assert!(!v.human_review_needed);
        assert_eq!(v.confidence, 1.0);
        assert_eq!(v.regulation_names(), ["COPPA"]);
        assert_eq!(v.successful_agents, 3);
        assert_eq!(v.total_agents, 3);
    }

    #[test]
    fn business_without_regulations_needs_nothing() {
        let v = consolidate(
            &feature(),
            vec![intent(Intent::Business, 1.0), legal(RiskLevel::Low, 0.5, &[]), technical(0.75)],
            3,
        );
        assert!(!v.needs_compliance_logic);
        assert_eq!(v.risk_level, RiskLevel::Low);
        assert_eq!(v.action_required, ActionRequired::NoAction);
        assert!(!v.human_review_needed);
    }

    #[test]
    fn regulations_alone_imply_compliance_logic() {
        let v = consolidate(
            &feature(),
            vec![intent(Intent::Business, 0.6), legal(RiskLevel::Low, 0.8, &["GDPR"]), technical(0.7)],
            3,
        );
        assert!(v.needs_compliance_logic);
        assert_eq!(v.action_required, ActionRequired::Monitor);
        assert_eq!(v.confidence, 0.8);
    }

    #[test]
    fn high_risk_implements_and_flags_review() {
        let v = consolidate(
            &feature(),
            vec![intent(Intent::Compliance, 0.9), legal(RiskLevel::High, 0.9, &["CCPA"]), technical(0.8)],
            3,
        );
        assert_eq!(v.action_required, ActionRequired::ImplementCompliance);
        assert!(v.human_review_needed);
    }

    #[test]
    fn high_risk_under_review_keeps_human_review_action() {
        let v = consolidate(
            &feature(),
            vec![
                intent(Intent::Compliance, 0.9),
                legal(RiskLevel::High, 0.9, &["CCPA"]),
                AgentFinding::failed(AgentKind::TechnicalAnalyst, "boom"),
            ],
            2,
        );
        assert_eq!(v.action_required, ActionRequired::HumanReview);
        assert!(v.human_review_needed);
        assert_eq!(v.risk_level, RiskLevel::High);
    }

    #[test]
    fn ambiguous_intent_goes_to_human() {
        let v = consolidate(
            &feature(),
            vec![intent(Intent::Ambiguous, 1.0), legal(RiskLevel::Low, 0.5, &[]), technical(0.7)],
            3,
        );
        assert!(v.human_review_needed);
        assert_eq!(v.action_required, ActionRequired::HumanReview);
        // no positive signal, so confidence falls back to consensus
        assert!((v.confidence - v.agent_consensus).abs() < 1e-6);
    }

    #[test]
    fn low_consensus_goes_to_human() {
        let v = consolidate(
            &feature(),
            vec![intent(Intent::Business, 0.4), legal(RiskLevel::Low, 0.3, &[]), technical(0.3)],
            3,
        );
        assert!(v.agent_consensus < 0.5);
        assert!(v.human_review_needed);
    }

    #[test]
    fn failed_agent_forces_review_and_keeps_other_reasoning() {
        let v = consolidate(
            &feature(),
            vec![
                intent(Intent::Business, 1.0),
                AgentFinding::failed(AgentKind::LegalAnalyst, "retrieval exploded"),
                technical(1.0),
            ],
            2,
        );
        assert!(v.human_review_needed);
        assert_eq!(v.successful_agents, 2);
        assert!(v.reasoning.iter().any(|l| l == "[Intent Classifier] Primary intent: business"));
        assert!(v.reasoning.iter().any(|l| l.contains("retrieval exploded")));
        assert!(v.reasoning.iter().any(|l| l == "[Technical Analyst] Complexity: medium"));
    }

    #[test]
    fn regulations_deduplicated_case_insensitively_in_order() {
        let mut other = legal(RiskLevel::Low, 0.6, &["gdpr", "COPPA", "DSA"]);
        other.agent = AgentKind::TechnicalAnalyst;
        let v = consolidate(
            &feature(),
            vec![legal(RiskLevel::Low, 0.6, &["COPPA", "GDPR", "COPPA"]), other],
            2,
        );
        assert_eq!(v.regulation_names(), ["COPPA", "GDPR", "DSA"]);
    }

    #[test]
    fn notes_from_technical_finding() {
        let v = consolidate(&feature(), vec![intent(Intent::Business, 1.0), technical(0.8)], 2);
        assert_eq!(
            v.implementation_notes,
            [
                "Technical complexity: medium",
                "Security considerations: authentication",
                "Integration points: user_service",
            ]
        );
    }

    #[test]
    fn no_findings_is_inconclusive() {
        let v = consolidate(&feature(), Vec::new(), 0);
        assert_eq!(v.agent_consensus, 0.0);
        assert!(v.human_review_needed);
        assert!(v.implementation_notes.is_empty());
    }
}
