pub mod config;
pub mod document;
pub mod feature;
pub mod finding;
pub mod schema;
pub mod text;
pub mod verdict;

pub use config::{AnalysisConfig, ConfigError};
pub use document::{ContentType, ReferenceDocument, RetrievalResult, ScoredDocument};
pub use feature::{Feature, FeatureError};
pub use finding::{
    AgentFinding, AgentKind, Complexity, FindingPayload, Intent, IntentAssessment, IntentScores,
    LegalAssessment, LegalSource, RegulationEntry, RiskLevel, TechnicalAssessment,
};
pub use schema::corpus;
pub use text::{TextProbe, normalize_text, word_set};
pub use verdict::{ActionRequired, Verdict};
