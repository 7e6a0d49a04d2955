//! Concurrent fan-out of one feature to every registered agent.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use lawgate_ai::TextCompletion;
use lawgate_core::{AgentFinding, AgentKind, AnalysisConfig, Feature, Verdict};
use lawgate_store::{ResultCache, Retriever};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::intent::IntentClassifier;
use crate::legal::LegalAnalyst;
use crate::technical::TechnicalAnalyst;
use crate::validator::consolidate;

pub struct Orchestrator {
    agents: Vec<Arc<dyn Agent>>,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            agents: Vec::new(),
            request_timeout,
        }
    }

    /// Intent Classifier, Legal Analyst and Technical Analyst, in that order.
    pub fn standard(
        config: &AnalysisConfig,
        retriever: Arc<dyn Retriever>,
        cache: Arc<ResultCache>,
        completion: Option<Arc<dyn TextCompletion>>,
    ) -> Self {
        let mut legal = LegalAnalyst::new(retriever, cache).with_config(config);
        if let Some(completion) = completion {
            legal = legal.with_completion(completion);
        }
        Self::new(config.request_timeout())
            .with_agent(Arc::new(IntentClassifier::new()))
            .with_agent(Arc::new(legal))
            .with_agent(Arc::new(TechnicalAnalyst::new()))
    }

    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Run every agent on `feature` and consolidate. Never fails: invalid
    /// input and failed agents show up in the verdict instead.
    pub async fn analyze_feature(&self, feature: Feature) -> Verdict {
        if let Err(e) = feature.validate() {
            warn!(feature = %feature.id, error = %e, "rejecting invalid feature");
            return Verdict::undetermined(feature.id, feature.name, e.to_string());
        }

        let feature = Arc::new(feature);
        let total = self.agents.len();
        let mut set = JoinSet::new();
        let mut slot_of_task = HashMap::with_capacity(total);
        for (slot, agent) in self.agents.iter().enumerate() {
            let agent = Arc::clone(agent);
            let feature = Arc::clone(&feature);
            let handle = set.spawn(async move {
                let outcome = AssertUnwindSafe(agent.analyze(&feature)).catch_unwind().await;
                (slot, outcome)
            });
            slot_of_task.insert(handle.id(), slot);
        }

        let mut findings: Vec<Option<AgentFinding>> = vec![None; total];
        let mut successful = 0;
        let deadline = Instant::now() + self.request_timeout;
        loop {
            let next = timeout_at(deadline, set.join_next()).await;
            let joined = match next {
                Ok(Some(joined)) => joined,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        feature = %feature.id,
                        timeout_secs = self.request_timeout.as_secs_f64(),
                        pending = set.len(),
                        "request deadline reached, aborting pending agents"
                    );
                    set.abort_all();
                    break;
                }
            };
            let (slot, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "agent task ended without a result");
                    if let Some(&slot) = slot_of_task.get(&e.id()) {
                        findings[slot] = Some(join_failure(self.agents[slot].kind(), &e));
                    }
                    continue;
                }
            };
            let kind = self.agents[slot].kind();
            let finding = match outcome {
                Ok(Ok(finding)) => {
                    successful += 1;
                    finding
                }
                Ok(Err(e)) => {
                    warn!(agent = %kind, error = %e, "agent failed");
                    AgentFinding::failed(kind, format!("{e:#}"))
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(agent = %kind, panic = %message, "agent panicked");
                    AgentFinding::failed(kind, format!("panicked: {message}"))
                }
            };
            findings[slot] = Some(finding);
        }

        let findings: Vec<AgentFinding> = findings
            .into_iter()
            .enumerate()
            .map(|(slot, finding)| {
                finding.unwrap_or_else(|| {
                    AgentFinding::failed(
                        self.agents[slot].kind(),
                        format!(
                            "did not finish within {:.1}s",
                            self.request_timeout.as_secs_f64()
                        ),
                    )
                })
            })
            .collect();

        info!(feature = %feature.id, successful, total, "agents completed");
        consolidate(&feature, findings, successful)
    }

    /// Analyse each feature in turn; verdicts come back in input order.
    pub async fn analyze_batch(&self, features: Vec<Feature>) -> Vec<Verdict> {
        let mut verdicts = Vec::with_capacity(features.len());
        for feature in features {
            verdicts.push(self.analyze_feature(feature).await);
        }
        info!(count = verdicts.len(), "batch analysed");
        verdicts
    }
}

fn join_failure(kind: AgentKind, error: &JoinError) -> AgentFinding {
    let reason = if error.is_cancelled() {
        "task was cancelled".to_string()
    } else {
        format!("task failed: {error}")
    };
    AgentFinding::failed(kind, reason)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
