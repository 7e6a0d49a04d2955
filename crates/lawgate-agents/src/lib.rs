//! Analysis agents, the validator that merges their findings, and the
//! orchestrator that runs them concurrently per feature.

pub mod agent;
pub mod intent;
pub mod legal;
pub mod lexicon;
pub mod orchestrator;
pub mod relevance;
pub mod technical;
pub mod validator;

pub use agent::Agent;
pub use intent::IntentClassifier;
pub use legal::LegalAnalyst;
pub use orchestrator::Orchestrator;
pub use technical::TechnicalAnalyst;
pub use validator::consolidate;
