pub mod cache;
pub mod corpus;
pub mod error;
pub mod keyword;
#[cfg(feature = "lancedb")]
pub mod lance;
pub mod retrieval;

pub use cache::ResultCache;
pub use corpus::{corpus_fingerprint, load_corpus, parse_corpus};
pub use error::StoreError;
pub use keyword::KeywordIndex;
#[cfg(feature = "lancedb")]
pub use lance::{IndexStats, LanceIndex};
pub use retrieval::{QueryEmbedder, RetrievalMode, RetrievalService, Retriever};
