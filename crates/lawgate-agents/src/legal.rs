//! Legal Analyst: which regulations apply to a feature, and how risky is it?
//!
//! Retrieves reference documents, then answers from the result cache, the
//! text-completion collaborator, or a local relevance rule, in that order.
//! Only completion answers are cached.

use std::sync::Arc;

use async_trait::async_trait;
use lawgate_ai::{Reply, TextCompletion};
use lawgate_core::{
    AgentFinding, AgentKind, AnalysisConfig, Feature, FindingPayload, LegalAssessment, LegalSource,
    RegulationEntry, RetrievalResult, RiskLevel, TextProbe,
};
use lawgate_store::{ResultCache, Retriever};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::lexicon::REGULATIONS;
use crate::relevance::{
    assess_risk, detect_jurisdiction, extract_requirements, regulation_name, relevance_score,
};

pub const SYSTEM_PROMPT: &str = "\
You are a regulatory compliance analyst reviewing software features for a \
large social media platform. Decide which laws and regulations the feature \
must satisfy (for example COPPA, GDPR, CCPA, the Digital Services Act or US \
state social media laws) and how much compliance risk it carries. Base your \
answer on the feature text and the reference excerpts in the context. \
Respond with a single JSON object with these fields:
- applicable_regulations: list of {\"name\", \"reason\", \"risk\"} objects
- risk_level: \"high\", \"medium\" or \"low\"
- compliance_requirements: list of specific requirements
- recommendations: list of actionable recommendations
- overall_assessment: one sentence summary";

const STRUCTURED_CONFIDENCE: f32 = 0.9;
const RAW_CONFIDENCE: f32 = 0.7;
const RAW_MENTION_RELEVANCE: f32 = 0.8;
const RETRIEVED_NONE_KEPT_CONFIDENCE: f32 = 0.5;
const NOTHING_RETRIEVED_CONFIDENCE: f32 = 0.3;
const CONTEXT_EXCERPT_CHARS: usize = 500;
const ENTRY_EXCERPT_CHARS: usize = 200;

pub struct LegalAnalyst {
    retriever: Arc<dyn Retriever>,
    cache: Arc<ResultCache>,
    completion: Option<Arc<dyn TextCompletion>>,
    retrieval_limit: usize,
    relevance_threshold: f32,
}

impl LegalAnalyst {
    pub fn new(retriever: Arc<dyn Retriever>, cache: Arc<ResultCache>) -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            retriever,
            cache,
            completion: None,
            retrieval_limit: defaults.retrieval_limit,
            relevance_threshold: defaults.relevance_threshold,
        }
    }

    pub fn with_completion(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_config(mut self, config: &AnalysisConfig) -> Self {
        self.retrieval_limit = config.retrieval_limit;
        self.relevance_threshold = config.relevance_threshold;
        self
    }

    async fn consult(
        &self,
        completion: &dyn TextCompletion,
        feature: &Feature,
        prompt: &str,
        documents: &RetrievalResult,
    ) -> Option<AgentFinding> {
        let context = build_context(feature, documents);
        match completion.complete(prompt, Some(&context)).await {
            Ok(Reply::Structured(value)) => {
                info!(model = completion.model(), "structured completion reply");
                Some(from_structured(&value, documents.len()))
            }
            Ok(Reply::Raw(text)) => {
                warn!(model = completion.model(), "completion reply was not JSON, scanning text");
                Some(from_raw(&text, documents.len()))
            }
            Err(e) => {
                warn!(model = completion.model(), error = %e, "completion failed, using local relevance rule");
                None
            }
        }
    }

    fn heuristic(&self, feature: &Feature, documents: &RetrievalResult, note: Option<&str>) -> AgentFinding {
        let mut reasoning = vec![format!("Retrieved {} reference documents", documents.len())];
        reasoning.extend(note.map(str::to_string));

        let mut regulations = Vec::new();
        let mut best: Option<f32> = None;
        let feature_text = feature.full_text();
        for scored in documents {
            let doc = &scored.document;
            let relevance = relevance_score(&feature_text, doc);
            if relevance < self.relevance_threshold {
                debug!(title = %doc.title, relevance, "document below relevance threshold");
                continue;
            }
            best = Some(best.map_or(relevance, |b| b.max(relevance)));

            let entry = RegulationEntry {
                relevance: Some(relevance),
                jurisdiction: detect_jurisdiction(doc),
                risk: Some(assess_risk(&doc.search_text())),
                requirements: extract_requirements(&doc.body),
                excerpt: Some(doc.excerpt(ENTRY_EXCERPT_CHARS)),
                ..RegulationEntry::new(
                    regulation_name(doc),
                    format!("Retrieved {} '{}' matched with relevance {relevance:.2}", doc.content_type.as_str(), doc.title),
                )
            };
            reasoning.push(format!("Regulation '{}' with relevance {relevance:.2}", entry.name));
            regulations.push(entry);
        }

        let risk_level = regulations
            .iter()
            .filter_map(|r| r.risk)
            .max()
            .unwrap_or(RiskLevel::Low);
        let confidence = match best {
            Some(b) => b,
            None if documents.is_empty() => NOTHING_RETRIEVED_CONFIDENCE,
            None => RETRIEVED_NONE_KEPT_CONFIDENCE,
        };
        if regulations.is_empty() {
            reasoning.push(format!(
                "No document reached relevance {:.2}",
                self.relevance_threshold
            ));
        }

        let mut finding = AgentFinding::new(
            AgentKind::LegalAnalyst,
            confidence,
            FindingPayload::Legal(LegalAssessment {
                risk_level,
                source: LegalSource::Heuristic,
                documents_considered: documents.len(),
                cached: false,
            }),
        )
        .with_regulations(regulations);
        finding.reasoning = reasoning;
        finding
    }
}

/// Cache reference text: what was retrieved, in order.
fn cache_reference(documents: &RetrievalResult) -> String {
    documents
        .iter()
        .map(|s| format!("{}\n{}", s.document.title, s.document.excerpt(CONTEXT_EXCERPT_CHARS)))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub fn build_prompt(feature: &Feature) -> String {
    let mut prompt = format!(
        "{SYSTEM_PROMPT}\n\nFeature Name: {}\nDescription: {}\n",
        feature.name, feature.description
    );
    if let Some(code) = feature.code.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nImplementation excerpt:\n{code}\n"));
    }
    prompt
}

fn build_context(feature: &Feature, documents: &RetrievalResult) -> Value {
    let docs: Vec<Value> = documents
        .iter()
        .map(|s| {
            json!({
                "title": s.document.title,
                "jurisdiction": s.document.jurisdiction,
                "content_type": s.document.content_type.as_str(),
                "score": s.score,
                "excerpt": s.document.excerpt(CONTEXT_EXCERPT_CHARS),
            })
        })
        .collect();
    json!({
        "feature": {"id": feature.id, "name": feature.name},
        "retrieved_documents": docs,
    })
}

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_str))
}

fn regulation_from_value(value: &Value) -> Option<RegulationEntry> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(RegulationEntry::new(
            name.trim(),
            "Identified by completion analysis",
        )),
        Value::Object(_) => {
            let name = str_field(value, &["name", "regulation"])?.trim();
            if name.is_empty() {
                return None;
            }
            let reason = str_field(value, &["reason", "description"])
                .unwrap_or("Identified by completion analysis");
            let requirements = value
                .get("requirements")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(RegulationEntry {
                relevance: value.get("relevance").and_then(Value::as_f64).map(|r| r as f32),
                jurisdiction: str_field(value, &["jurisdiction"]).map(str::to_string),
                risk: str_field(value, &["risk", "severity", "compliance_risk"])
                    .and_then(RiskLevel::from_label),
                requirements,
                ..RegulationEntry::new(name, reason)
            })
        }
        _ => None,
    }
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn from_structured(value: &Value, documents_considered: usize) -> AgentFinding {
    let regulations: Vec<RegulationEntry> = value
        .get("applicable_regulations")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(regulation_from_value).collect())
        .unwrap_or_default();

    let adjusted = value
        .get("adjusted_risk_score")
        .or_else(|| value.pointer("/confidence_adjustments/adjusted_risk_score"))
        .and_then(Value::as_f64);
    let risk_level = str_field(value, &["risk_level"])
        .and_then(RiskLevel::from_label)
        .or(adjusted.map(RiskLevel::from_score))
        .or_else(|| regulations.iter().filter_map(|r| r.risk).max())
        .unwrap_or(RiskLevel::Low);

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .map_or(STRUCTURED_CONFIDENCE, |c| c as f32);

    let mut reasoning = vec![format!(
        "Completion analysis: {}",
        str_field(value, &["overall_assessment", "reasoning", "summary"]).unwrap_or("analysis completed")
    )];
    reasoning.extend(
        string_list(value, "compliance_requirements")
            .into_iter()
            .map(|r| format!("Requirement: {r}")),
    );
    reasoning.extend(
        string_list(value, "recommendations")
            .into_iter()
            .map(|r| format!("Recommendation: {r}")),
    );

    let mut finding = AgentFinding::new(
        AgentKind::LegalAnalyst,
        confidence,
        FindingPayload::Legal(LegalAssessment {
            risk_level,
            source: LegalSource::Structured,
            documents_considered,
            cached: false,
        }),
    )
    .with_regulations(regulations);
    finding.reasoning = reasoning;
    finding
}

fn from_raw(text: &str, documents_considered: usize) -> AgentFinding {
    let probe = TextProbe::new(text);
    let regulations: Vec<RegulationEntry> = REGULATIONS
        .iter()
        .filter(|(_, terms)| probe.has_any(terms))
        .map(|(name, _)| RegulationEntry {
            relevance: Some(RAW_MENTION_RELEVANCE),
            ..RegulationEntry::new(*name, "Mentioned in completion analysis")
        })
        .collect();

    let risk_level = if probe.has_any(&["high risk", "critical"]) {
        RiskLevel::High
    } else if probe.has_any(&["low risk", "minimal"]) {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };

    let snippet: String = text.chars().take(200).collect();
    let mut finding = AgentFinding::new(
        AgentKind::LegalAnalyst,
        RAW_CONFIDENCE,
        FindingPayload::Legal(LegalAssessment {
            risk_level,
            source: LegalSource::RawText,
            documents_considered,
            cached: false,
        }),
    )
    .with_regulations(regulations);
    finding.reasoning = vec![format!("Completion text analysis: {}", snippet.trim())];
    finding
}

#[async_trait]
impl Agent for LegalAnalyst {
    fn kind(&self) -> AgentKind {
        AgentKind::LegalAnalyst
    }

    async fn analyze(&self, feature: &Feature) -> anyhow::Result<AgentFinding> {
        let documents = self
            .retriever
            .search(&feature.description, self.retrieval_limit)
            .await;
        let reference = cache_reference(&documents);
        // Keyed on the full prompt so name and code changes miss the cache.
        let prompt = build_prompt(feature);

        if let Some(mut finding) = self.cache.get::<AgentFinding>(&prompt, &reference) {
            if let FindingPayload::Legal(assessment) = &mut finding.payload {
                assessment.cached = true;
            }
            finding.reasoning.push("Served from result cache".to_string());
            return Ok(finding);
        }

        let Some(completion) = &self.completion else {
            return Ok(self.heuristic(feature, &documents, None));
        };

        match self.consult(completion.as_ref(), feature, &prompt, &documents).await {
            Some(finding) => {
                if let Err(e) = self.cache.put(&prompt, &reference, &finding) {
                    warn!(error = %e, "failed to persist legal finding to cache");
                }
                Ok(finding)
            }
            None => Ok(self.heuristic(
                feature,
                &documents,
                Some("Completion unavailable, applied local relevance rule"),
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration;
    use lawgate_ai::CompletionError;
    use lawgate_core::{ReferenceDocument, ScoredDocument};
    use lawgate_store::RetrievalService;

    pub(crate) fn coppa_statute() -> ReferenceDocument {
        ReferenceDocument::statute(
            "Children's Online Privacy Protection Act (COPPA)",
            "Operators of online services directed to children under 13 must obtain verifiable \
             parental consent before collecting personal information from a child. Operators \
             shall provide age verification mechanisms.",
        )
        .with_jurisdiction("US")
    }

    pub(crate) fn test_corpus() -> Vec<ReferenceDocument> {
        vec![
            coppa_statute(),
            ReferenceDocument::new(
                "Accessible theme guidance",
                "Dark and light themes should keep a readable contrast ratio for users.",
            ),
        ]
    }

    struct StaticRetriever(RetrievalResult);

    #[async_trait]
    impl Retriever for StaticRetriever {
        async fn search(&self, _query: &str, limit: usize) -> RetrievalResult {
            self.0.iter().take(limit).cloned().collect()
        }
    }

    enum Script {
        Reply(Reply),
        Fail,
    }

    struct ScriptedCompletion {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedCompletion {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextCompletion for ScriptedCompletion {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str, context: Option<&Value>) -> Result<Reply, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("Feature Name:"));
            assert!(context.is_some_and(|c| c["retrieved_documents"].is_array()));
            match &self.script {
                Script::Reply(reply) => Ok(reply.clone()),
                Script::Fail => Err(CompletionError::Unavailable("offline".into())),
            }
        }
    }

    fn age_gate() -> Feature {
        Feature::new(
            "Age Verification Gate",
            "Require users under 13 to pass age verification and obtain parental consent \
             before account creation, to comply with COPPA.",
        )
    }

    fn cache() -> Arc<ResultCache> {
        Arc::new(ResultCache::in_memory(Duration::days(30)))
    }

    fn keyword_analyst(cache: Arc<ResultCache>) -> LegalAnalyst {
        LegalAnalyst::new(Arc::new(RetrievalService::keyword(test_corpus())), cache)
    }

    #[tokio::test]
    async fn heuristic_keeps_relevant_statute() {
        let finding = keyword_analyst(cache()).analyze(&age_gate()).await.unwrap();
        let names: Vec<&str> = finding.regulations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["COPPA"]);

        let coppa = &finding.regulations[0];
        assert_eq!(coppa.risk, Some(RiskLevel::Medium));
        assert_eq!(coppa.jurisdiction.as_deref(), Some("US"));
        assert!(!coppa.requirements.is_empty());
        assert!((finding.confidence - 0.85).abs() < 1e-5);

        let legal = finding.legal().unwrap();
        assert_eq!(legal.source, LegalSource::Heuristic);
        assert_eq!(legal.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn heuristic_with_nothing_relevant() {
        let feature = Feature::new(
            "Dark Mode Toggle",
            "Add a UI setting that lets users switch between light and dark themes.",
        );
        let finding = keyword_analyst(cache()).analyze(&feature).await.unwrap();
        assert!(finding.regulations.is_empty());
        assert_eq!(finding.confidence, 0.5);
        assert_eq!(finding.legal().unwrap().risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn heuristic_with_nothing_retrieved() {
        let analyst = LegalAnalyst::new(Arc::new(StaticRetriever(Vec::new())), cache());
        let finding = analyst.analyze(&age_gate()).await.unwrap();
        assert_eq!(finding.confidence, 0.3);
        assert_eq!(finding.legal().unwrap().documents_considered, 0);
    }

    #[tokio::test]
    async fn threshold_follows_config() {
        let config = AnalysisConfig {
            relevance_threshold: 0.9,
            ..AnalysisConfig::default()
        };
        let finding = keyword_analyst(cache())
            .with_config(&config)
            .analyze(&age_gate())
            .await
            .unwrap();
        assert!(finding.regulations.is_empty());
    }

    #[tokio::test]
    async fn structured_reply_is_used_and_cached() {
        let completion = ScriptedCompletion::new(Script::Reply(Reply::Structured(json!({
            "applicable_regulations": [
                "COPPA",
                {"regulation": "CCPA", "description": "Sale of minors' data", "severity": "high"}
            ],
            "risk_level": "high",
            "compliance_requirements": ["Verify parental consent"],
            "overall_assessment": "Child-directed onboarding"
        }))));
        let cache = cache();
        let analyst = keyword_analyst(Arc::clone(&cache)).with_completion(completion.clone());

        let first = analyst.analyze(&age_gate()).await.unwrap();
        let names: Vec<&str> = first.regulations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["COPPA", "CCPA"]);
        assert_eq!(first.regulations[1].risk, Some(RiskLevel::High));
        assert_eq!(first.confidence, 0.9);
        assert_eq!(first.legal().unwrap().risk_level, RiskLevel::High);
        assert_eq!(first.legal().unwrap().source, LegalSource::Structured);
        assert!(first.reasoning.iter().any(|r| r == "Requirement: Verify parental consent"));
        assert_eq!(cache.len(), 1);

        let second = analyst.analyze(&age_gate()).await.unwrap();
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
        assert!(second.legal().unwrap().cached);
        assert_eq!(second.regulations, first.regulations);
    }

    #[tokio::test]
    async fn cache_distinguishes_name_and_code() {
        let completion = ScriptedCompletion::new(Script::Reply(Reply::Structured(json!({
            "applicable_regulations": ["COPPA"],
            "risk_level": "medium"
        }))));
        let cache = cache();
        let analyst = keyword_analyst(Arc::clone(&cache)).with_completion(completion.clone());

        let plain = age_gate();
        let with_code = age_gate().with_code("fn gate(age: u8) -> bool { age >= 13 }");
        let renamed = Feature::new("Signup Age Check", plain.description.clone());

        analyst.analyze(&plain).await.unwrap();
        let coded = analyst.analyze(&with_code).await.unwrap();
        analyst.analyze(&renamed).await.unwrap();
        assert_eq!(completion.calls.load(Ordering::SeqCst), 3);
        assert!(!coded.legal().unwrap().cached);
        assert_eq!(cache.len(), 3);

        let again = analyst.analyze(&with_code).await.unwrap();
        assert_eq!(completion.calls.load(Ordering::SeqCst), 3);
        assert!(again.legal().unwrap().cached);
    }

    #[tokio::test]
    async fn cached_finding_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let reply = Reply::Structured(json!({"applicable_regulations": ["COPPA"], "risk_level": "medium"}));

        let first = ScriptedCompletion::new(Script::Reply(reply.clone()));
        let cache = Arc::new(ResultCache::open(&path, Duration::days(30)).unwrap());
        keyword_analyst(cache)
            .with_completion(first.clone())
            .analyze(&age_gate())
            .await
            .unwrap();

        let second = ScriptedCompletion::new(Script::Reply(reply));
        let reopened = Arc::new(ResultCache::open(&path, Duration::days(30)).unwrap());
        let finding = keyword_analyst(reopened)
            .with_completion(second.clone())
            .analyze(&age_gate())
            .await
            .unwrap();
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert!(finding.legal().unwrap().cached);
        assert_eq!(finding.regulations[0].name, "COPPA");
    }

    #[tokio::test]
    async fn adjusted_risk_score_sets_risk() {
        let completion = ScriptedCompletion::new(Script::Reply(Reply::Structured(json!({
            "applicable_regulations": [],
            "confidence_adjustments": {"adjusted_risk_score": 0.6}
        }))));
        let finding = keyword_analyst(cache())
            .with_completion(completion)
            .analyze(&age_gate())
            .await
            .unwrap();
        assert_eq!(finding.legal().unwrap().risk_level, RiskLevel::Medium);
        assert!(finding.regulations.is_empty());
    }

    #[tokio::test]
    async fn raw_reply_is_scanned() {
        let completion = ScriptedCompletion::new(Script::Reply(Reply::Raw(
            "This is a critical issue under COPPA and possibly GDPR.".into(),
        )));
        let finding = keyword_analyst(cache())
            .with_completion(completion)
            .analyze(&age_gate())
            .await
            .unwrap();
        let names: Vec<&str> = finding.regulations.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["COPPA", "GDPR"]);
        assert_eq!(finding.legal().unwrap().risk_level, RiskLevel::High);
        assert_eq!(finding.legal().unwrap().source, LegalSource::RawText);
        assert_eq!(finding.confidence, 0.7);
    }

    #[test]
    fn raw_risk_phrases() {
        assert_eq!(from_raw("Minimal exposure.", 0).legal().unwrap().risk_level, RiskLevel::Low);
        assert_eq!(from_raw("Some concerns.", 0).legal().unwrap().risk_level, RiskLevel::Medium);
        assert_eq!(from_raw("HIGH RISK feature", 0).legal().unwrap().risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn completion_failure_falls_back_without_caching() {
        let completion = ScriptedCompletion::new(Script::Fail);
        let cache = cache();
        let finding = keyword_analyst(Arc::clone(&cache))
            .with_completion(completion.clone())
            .analyze(&age_gate())
            .await
            .unwrap();
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
        assert_eq!(finding.legal().unwrap().source, LegalSource::Heuristic);
        assert_eq!(finding.regulations[0].name, "COPPA");
        assert!(finding.reasoning.iter().any(|r| r.contains("Completion unavailable")));
        assert!(cache.is_empty());
    }

    #[test]
    fn prompt_includes_feature_and_code() {
        let feature = age_gate().with_code("fn gate(age: u8) -> bool { age >= 13 }");
        let prompt = build_prompt(&feature);
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("Feature Name: Age Verification Gate"));
        assert!(prompt.contains("age >= 13"));
    }

    #[test]
    fn context_lists_retrieved_documents() {
        let docs = vec![ScoredDocument {
            document: coppa_statute(),
            score: 0.8,
        }];
        let ctx = build_context(&age_gate(), &docs);
        assert_eq!(ctx["retrieved_documents"][0]["content_type"], "statute");
        assert_eq!(ctx["retrieved_documents"][0]["jurisdiction"], "US");
    }
}
