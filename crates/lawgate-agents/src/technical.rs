//! Technical Analyst: how hard is the feature to build, and what does it touch?

use async_trait::async_trait;
use lawgate_core::{
    AgentFinding, AgentKind, Complexity, Feature, FindingPayload, TechnicalAssessment, TextProbe,
};

use crate::agent::Agent;
use crate::lexicon::{
    COMPLEXITY_HIGH, COMPLEXITY_LOW, COMPLEXITY_MEDIUM, DATA_FLOWS, INTEGRATIONS, SECURITY, label,
};

const REQUIREMENTS_WEIGHT: f32 = 0.8;
const INTEGRATIONS_WEIGHT: f32 = 0.7;
const DATA_FLOWS_WEIGHT: f32 = 0.6;
const SECURITY_WEIGHT: f32 = 0.9;
const NO_SIGNAL_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Default, Clone, Copy)]
pub struct TechnicalAnalyst;

impl TechnicalAnalyst {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, feature: &Feature) -> TechnicalAssessment {
        let probe = TextProbe::new(&feature.full_text());
        let (complexity, requirements) = complexity(&probe);
        TechnicalAssessment {
            complexity,
            requirements,
            integration_points: categories(&probe, INTEGRATIONS),
            data_flows: categories(&probe, DATA_FLOWS),
            security_considerations: categories(&probe, SECURITY),
        }
    }
}

fn complexity(probe: &TextProbe) -> (Complexity, Vec<String>) {
    let high = probe.matches(COMPLEXITY_HIGH);
    let medium = probe.matches(COMPLEXITY_MEDIUM);

    let (tier, terms) = if high.len() >= 2 {
        (Complexity::High, high)
    } else if medium.len() >= 2 || !high.is_empty() {
        (Complexity::Medium, [high, medium].concat())
    } else {
        (Complexity::Low, probe.matches(COMPLEXITY_LOW))
    };
    (tier, terms.into_iter().map(|t| label(t).to_string()).collect())
}

fn categories(probe: &TextProbe, table: &[(&str, &[&str])]) -> Vec<String> {
    table
        .iter()
        .filter(|(_, terms)| probe.has_any(terms))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn confidence(assessment: &TechnicalAssessment) -> f32 {
    let weights: Vec<f32> = [
        (assessment.requirements.is_empty(), REQUIREMENTS_WEIGHT),
        (assessment.integration_points.is_empty(), INTEGRATIONS_WEIGHT),
        (assessment.data_flows.is_empty(), DATA_FLOWS_WEIGHT),
        (assessment.security_considerations.is_empty(), SECURITY_WEIGHT),
    ]
    .into_iter()
    .filter(|(empty, _)| !empty)
    .map(|(_, w)| w)
    .collect();

    if weights.is_empty() {
        NO_SIGNAL_CONFIDENCE
    } else {
        weights.iter().sum::<f32>() / weights.len() as f32
    }
}

fn reasoning(assessment: &TechnicalAssessment) -> Vec<String> {
    let mut lines = vec![format!("Complexity: {}", assessment.complexity.as_str())];
    let sections = [
        ("Technical requirements", &assessment.requirements),
        ("Integration points", &assessment.integration_points),
        ("Data flows", &assessment.data_flows),
        ("Security considerations", &assessment.security_considerations),
    ];
    for (heading, items) in sections {
        if !items.is_empty() {
            lines.push(format!("{heading}: {}", items.join(", ")));
        }
    }
    lines
}

#[async_trait]
impl Agent for TechnicalAnalyst {
    fn kind(&self) -> AgentKind {
        AgentKind::TechnicalAnalyst
    }

    async fn analyze(&self, feature: &Feature) -> anyhow::Result<AgentFinding> {
        let assessment = self.assess(feature);
        let mut finding = AgentFinding::new(
            AgentKind::TechnicalAnalyst,
            confidence(&assessment),
            FindingPayload::Technical(assessment.clone()),
        );
        finding.reasoning = reasoning(&assessment);
        Ok(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(name: &str, description: &str) -> TechnicalAssessment {
        TechnicalAnalyst::new().assess(&Feature::new(name, description))
    }

    #[test]
    fn two_high_tier_terms_is_high() {
        let a = assess(
            "Smart feed",
            "A machine learning ranking algorithm over a distributed event stream.",
        );
        assert_eq!(a.complexity, Complexity::High);
        assert_eq!(a.requirements, ["machine learning", "algorithm", "distributed"]);
    }

    #[test]
    fn one_high_tier_term_is_medium() {
        let a = assess("Secure notes", "Encrypt notes before upload.");
        assert_eq!(a.complexity, Complexity::Medium);
        assert_eq!(a.requirements, ["encrypt"]);
    }

    #[test]
    fn two_medium_tier_terms_is_medium() {
        let a = assess("Report export", "Expose an API reading from the database.");
        assert_eq!(a.complexity, Complexity::Medium);
        assert_eq!(a.requirements, ["api", "database"]);
    }

    #[test]
    fn toggle_is_low() {
        let a = assess(
            "Dark Mode Toggle",
            "Add a UI setting that lets users switch between light and dark themes for a better user experience.",
        );
        assert_eq!(a.complexity, Complexity::Low);
        assert_eq!(a.requirements, ["toggle", "setting"]);
        assert_eq!(a.integration_points, ["user_service"]);
        assert!(a.data_flows.is_empty());
        assert!(a.security_considerations.is_empty());
        assert!((confidence(&a) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn age_gate_touches_users_and_verification() {
        let a = assess(
            "Age Verification Gate",
            "Require users under 13 to pass age verification and obtain parental consent \
             before account creation, to comply with COPPA.",
        );
        assert_eq!(a.complexity, Complexity::Low);
        assert_eq!(a.integration_points, ["user_service"]);
        assert_eq!(a.data_flows, ["data_validation"]);
        assert_eq!(a.security_considerations, ["authentication"]);
        assert!((confidence(&a) - (0.7 + 0.6 + 0.9) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn nothing_matched_gives_floor_confidence() {
        let a = assess("Blank", "Nothing here.");
        assert_eq!(a.complexity, Complexity::Low);
        assert_eq!(confidence(&a), 0.3);
    }

    #[tokio::test]
    async fn analyze_is_deterministic() {
        let feature = Feature::new(
            "Geo analytics",
            "Store location data in the database and send metrics to the analytics API.",
        );
        let agent = TechnicalAnalyst::new();
        let first = agent.analyze(&feature).await.unwrap();
        for _ in 0..5 {
            assert_eq!(agent.analyze(&feature).await.unwrap(), first);
        }
        assert_eq!(first.reasoning[0], "Complexity: medium");
        assert!(first.reasoning.iter().any(|l| l.starts_with("Integration points:")));
    }
}
