//! Local relevance rule linking a feature description to a reference
//! document, plus the per-document extraction the Legal Analyst reports.

use std::collections::BTreeSet;

use lawgate_core::text::tokenize;
use lawgate_core::{ContentType, ReferenceDocument, RiskLevel, TextProbe};

use crate::lexicon::{
    HIGH_RISK_TERMS, JURISDICTIONS, LEGISLATION_MENTIONS, LOCATIONS, MEDIUM_RISK_TERMS, REGULATIONS,
    REQUIREMENT_MARKERS, TOPICS,
};

const GEO_MATCH: f32 = 0.4;
const GEO_MISMATCH: f32 = 0.1;
const GEO_UNSCOPED: f32 = 0.2;
const TOPIC_STEP: f32 = 0.1;
const TOPIC_CAP: f32 = 0.4;
const REGULATION_MATCH: f32 = 0.2;
const STATUTE_BONUS: f32 = 0.05;

const MAX_REQUIREMENTS: usize = 5;
const MAX_PER_MARKER: usize = 3;

fn named_hits(probe: &TextProbe, table: &[(&'static str, &[&str])]) -> BTreeSet<&'static str> {
    table
        .iter()
        .filter(|(_, terms)| probe.has_any(terms))
        .map(|(name, _)| *name)
        .collect()
}

pub fn locations(probe: &TextProbe) -> BTreeSet<&'static str> {
    named_hits(probe, LOCATIONS)
}

pub fn topics(probe: &TextProbe) -> BTreeSet<&'static str> {
    named_hits(probe, TOPICS)
}

/// Regulations and generic bill references mentioned in the text.
pub fn regulation_mentions(probe: &TextProbe) -> BTreeSet<&'static str> {
    let mut found = named_hits(probe, REGULATIONS);
    found.extend(LEGISLATION_MENTIONS.iter().copied().filter(|t| probe.has(t)));
    found
}

/// Relevance of `document` to a feature description, in `[0, 1]`.
///
/// - geography: 0.4 on a shared location, 0.1 when only the feature names
///   one, 0.2 when the feature names none
/// - topics: 0.1 per shared compliance topic, at most 0.4
/// - 0.2 when both mention the same regulation
/// - 0.05 for statutes
pub fn relevance_score(feature_text: &str, document: &ReferenceDocument) -> f32 {
    let feature = TextProbe::new(feature_text);
    let doc_text = match &document.jurisdiction {
        Some(j) => format!("{} {j}", document.search_text()),
        None => document.search_text(),
    };
    let doc = TextProbe::new(&doc_text);

    let feature_places = locations(&feature);
    let doc_places = locations(&doc);
    let mut score = if feature_places.is_empty() {
        GEO_UNSCOPED
    } else if !feature_places.is_disjoint(&doc_places) {
        GEO_MATCH
    } else if doc_places.is_empty() {
        GEO_MISMATCH
    } else {
        0.0
    };

    let shared_topics = topics(&feature).intersection(&topics(&doc)).count();
    score += (shared_topics as f32 * TOPIC_STEP).min(TOPIC_CAP);

    if !regulation_mentions(&feature).is_disjoint(&regulation_mentions(&doc)) {
        score += REGULATION_MATCH;
    }
    if document.content_type == ContentType::Statute {
        score += STATUTE_BONUS;
    }
    score.min(1.0)
}

/// Penalty or violation language is high risk, obligations are medium.
pub fn assess_risk(text: &str) -> RiskLevel {
    let probe = TextProbe::new(text);
    if probe.has_any(HIGH_RISK_TERMS) {
        RiskLevel::High
    } else if probe.has_any(MEDIUM_RISK_TERMS) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// First recognised regulation in the title, then the body; else the title.
pub fn regulation_name(document: &ReferenceDocument) -> String {
    [&document.title, &document.body]
        .into_iter()
        .find_map(|text| {
            let probe = TextProbe::new(text);
            REGULATIONS
                .iter()
                .find(|(_, terms)| probe.has_any(terms))
                .map(|(name, _)| name.to_string())
        })
        .unwrap_or_else(|| document.title.clone())
}

/// The document's own jurisdiction, else one inferred from its text.
pub fn detect_jurisdiction(document: &ReferenceDocument) -> Option<String> {
    if let Some(j) = document.jurisdiction.as_deref().filter(|j| !j.trim().is_empty()) {
        return Some(j.to_string());
    }
    let probe = TextProbe::new(&document.search_text());
    JURISDICTIONS
        .iter()
        .find(|(_, terms)| probe.has_any(terms))
        .map(|(name, _)| name.to_string())
}

/// Obligation clauses: the words following "must", "shall", "required to", ...
/// up to the end of the sentence.
pub fn extract_requirements(text: &str) -> Vec<String> {
    let sentences: Vec<Vec<String>> = text
        .split(['.', '!', '?'])
        .map(|s| tokenize(s).collect())
        .filter(|tokens: &Vec<String>| !tokens.is_empty())
        .collect();

    let mut found = Vec::new();
    for marker in REQUIREMENT_MARKERS {
        let marker: Vec<String> = tokenize(marker).collect();
        let clauses = sentences
            .iter()
            .filter_map(|tokens| {
                let at = tokens.windows(marker.len()).position(|w| w == marker.as_slice())?;
                let rest = &tokens[at + marker.len()..];
                (!rest.is_empty()).then(|| rest.join(" "))
            })
            .take(MAX_PER_MARKER);
        found.extend(clauses);
    }
    found.truncate(MAX_REQUIREMENTS);
    found
}
