use async_trait::async_trait;
use lawgate_core::{AgentFinding, AgentKind, Feature};

/// One independent analysis over a feature.
///
/// Implementations hold their collaborators and are shared across requests,
/// so `analyze` takes `&self`.
#[async_trait]
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;

    async fn analyze(&self, feature: &Feature) -> anyhow::Result<AgentFinding>;
}
