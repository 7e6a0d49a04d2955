//! Intent Classifier: is this feature driven by compliance or by business?

use async_trait::async_trait;
use lawgate_core::{
    AgentFinding, AgentKind, Feature, FindingPayload, IntentAssessment, IntentScores, TextProbe,
};

use crate::agent::Agent;
use crate::lexicon::{
    AMBIGUOUS_KEYWORDS, AMBIGUOUS_WEIGHT, BUSINESS_KEYWORDS, BUSINESS_WEIGHT, CATEGORY_WEIGHT,
    COMPLIANCE_CATEGORIES, COMPLIANCE_KEYWORDS, COMPLIANCE_WEIGHT, JARGON, REGIONS,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Score, classify and describe `feature`. Pure and deterministic.
    pub fn assess(&self, feature: &Feature) -> IntentAssessment {
        let text = feature.full_text();
        let probe = TextProbe::new(&text);

        let scores = intent_scores(&probe);
        let (intent, _) = scores.primary();

        IntentAssessment {
            intent,
            scores,
            expanded_description: expand_jargon(&text),
            jargon: detect_jargon(&text),
            geographic_scope: geographic_scope(&probe),
            categories: category_scores(&probe),
        }
    }
}

fn intent_scores(probe: &TextProbe) -> IntentScores {
    let category_hits: usize = COMPLIANCE_CATEGORIES
        .iter()
        .map(|(_, patterns)| probe.count(patterns))
        .sum();

    let compliance = probe.count(COMPLIANCE_KEYWORDS) as f32 * COMPLIANCE_WEIGHT
        + category_hits as f32 * CATEGORY_WEIGHT;
    let business = probe.count(BUSINESS_KEYWORDS) as f32 * BUSINESS_WEIGHT;
    let ambiguous = probe.count(AMBIGUOUS_KEYWORDS) as f32 * AMBIGUOUS_WEIGHT;

    let total = compliance + business + ambiguous;
    if total > 0.0 {
        IntentScores {
            compliance: compliance / total,
            business: business / total,
            ambiguous: ambiguous / total,
        }
    } else {
        IntentScores {
            compliance: 0.0,
            business: 0.0,
            ambiguous: 1.0,
        }
    }
}

/// Share of each category's patterns present, for categories with any hit.
fn category_scores(probe: &TextProbe) -> Vec<(String, f32)> {
    COMPLIANCE_CATEGORIES
        .iter()
        .filter_map(|(name, patterns)| {
            let hits = probe.count(patterns);
            (hits > 0).then(|| (name.to_string(), (hits as f32 / patterns.len() as f32).min(1.0)))
        })
        .collect()
}

fn geographic_scope(probe: &TextProbe) -> Vec<String> {
    REGIONS
        .iter()
        .filter(|(_, indicators)| probe.has_any(indicators))
        .map(|(region, _)| region.to_string())
        .collect()
}

fn jargon_expansion(word: &str) -> Option<(&'static str, &'static str)> {
    JARGON
        .iter()
        .copied()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(word))
}

/// Known abbreviations present as whole words, in table order.
fn detect_jargon(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split(|c: char| !c.is_alphanumeric()).collect();
    JARGON
        .iter()
        .filter(|(abbr, _)| words.iter().any(|w| w.eq_ignore_ascii_case(abbr)))
        .map(|(abbr, _)| abbr.to_string())
        .collect()
}

/// Append the expansion after every whole-word abbreviation, keeping the
/// original spelling: "ASL check" becomes
/// "ASL (Age/Sex/Location verification system) check".
pub fn expand_jargon(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start: Option<usize> = None;

    let flush = |out: &mut String, word: &str| {
        out.push_str(word);
        if let Some((_, full)) = jargon_expansion(word) {
            out.push_str(" (");
            out.push_str(full);
            out.push(')');
        }
    };

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            word_start.get_or_insert(i);
        } else {
            if let Some(start) = word_start.take() {
                flush(&mut out, &text[start..i]);
            }
            out.push(c);
        }
    }
    if let Some(start) = word_start {
        flush(&mut out, &text[start..]);
    }
    out
}

fn reasoning(assessment: &IntentAssessment, confidence: f32) -> Vec<String> {
    let mut lines = vec![format!(
        "Primary intent: {} (confidence: {confidence:.2})",
        assessment.intent.as_str()
    )];
    if !assessment.jargon.is_empty() {
        lines.push(format!("Jargon detected: {}", assessment.jargon.join(", ")));
    }
    if !assessment.geographic_scope.is_empty() {
        lines.push(format!(
            "Geographic scope: {}",
            assessment.geographic_scope.join(", ")
        ));
    }
    if !assessment.categories.is_empty() {
        let names: Vec<&str> = assessment.categories.iter().map(|(n, _)| n.as_str()).collect();
        lines.push(format!("Compliance categories detected: {}", names.join(", ")));
    }
    lines
}

#[async_trait]
impl Agent for IntentClassifier {
    fn kind(&self) -> AgentKind {
        AgentKind::IntentClassifier
    }

    async fn analyze(&self, feature: &Feature) -> anyhow::Result<AgentFinding> {
        let assessment = self.assess(feature);
        let (_, confidence) = assessment.scores.primary();
        let mut finding = AgentFinding::new(
            AgentKind::IntentClassifier,
            confidence,
            FindingPayload::Intent(assessment.clone()),
        );
        finding.reasoning = reasoning(&assessment, confidence);
        Ok(finding)
    }
}
