//! Model-backed collaborators: ONNX sentence embeddings and text completion.

pub mod completion;
#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "http")]
pub mod http;

pub use completion::{CompletionError, Reply, TextCompletion};
#[cfg(feature = "onnx")]
pub use embedder::Embedder;
#[cfg(feature = "http")]
pub use http::ChatCompletionClient;
