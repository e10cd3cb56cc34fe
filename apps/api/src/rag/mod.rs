// Retrieval-augmented generation: chunking, embeddings and per-session vector indexes.
// Indexes live in memory only and are lost on restart.

pub mod chunker;
pub mod embedder;
pub mod index;
pub mod store;

use thiserror::Error;

use crate::llm_client::LlmError;
use index::DocumentSource;

pub use embedder::{Embedder, OpenAiEmbedder};
pub use store::{RagStore, RetrievedContext};

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Embedding request failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("Nothing to index: the {0} text is empty")]
    EmptyDocument(DocumentSource),

    #[error("Expected {expected} embeddings, got {got}")]
    EmbeddingCount { expected: usize, got: usize },
}
