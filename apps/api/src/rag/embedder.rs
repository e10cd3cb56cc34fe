//! Embedding backends.
//!
//! `Embedder` is the seam between the vector index and whatever produces vectors.
//! Production uses `OpenAiEmbedder` (the embeddings endpoint via `LlmClient`), bound to the
//! caller's API key for the duration of one request.

use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};

/// Inputs per embeddings request.
const MAX_BATCH: usize = 96;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every input. The output has one vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    async fn embed_one(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(&[input.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::UnexpectedShape("no embedding returned".to_string()))
    }
}

pub struct OpenAiEmbedder {
    llm: LlmClient,
    api_key: String,
}

impl OpenAiEmbedder {
    pub fn new(llm: LlmClient, api_key: impl Into<String>) -> Self {
        Self {
            llm,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(MAX_BATCH) {
            vectors.extend(self.llm.embed(&self.api_key, batch).await?);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
pub mod testing {
    //! Deterministic embedder for tests: one dimension per vocabulary term,
    //! set to the number of times the term appears (case-insensitive).

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub struct VocabularyEmbedder {
        vocabulary: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl VocabularyEmbedder {
        pub fn new(vocabulary: &[&'static str]) -> Self {
            Self {
                vocabulary: vocabulary.to_vec(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for VocabularyEmbedder {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|input| {
                    let lower = input.to_lowercase();
                    self.vocabulary
                        .iter()
                        .map(|term| lower.matches(term).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    /// Embedder that always fails, for degradation paths.
    pub struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Err(LlmError::Api {
                status: 500,
                message: "embedding backend down".to_string(),
            })
        }
    }
}
