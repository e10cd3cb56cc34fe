use serde::{Deserialize, Serialize};

use super::chunker::{chunk_text, ChunkerConfig};
use super::embedder::Embedder;
use super::RagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Cv,
    Jd,
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSource::Cv => f.write_str("CV"),
            DocumentSource::Jd => f.write_str("job description"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkMetadata {
    pub session_id: String,
    pub chunk_index: usize,
    #[serde(rename = "type")]
    pub source: DocumentSource,
}

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    embedding: Vec<f32>,
}

/// Indexing summary returned to callers (and surfaced as `rag_details`).
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub chunks_count: usize,
    pub total_chars: usize,
    pub avg_chunk_size: f64,
    pub chunk_sizes: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a IndexedChunk,
    pub similarity: f32,
}

/// In-memory vector index over the chunks of one document.
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
    stats: IndexStats,
}

impl VectorIndex {
    /// Chunks and embeds `text`. Blank text is rejected.
    pub async fn build(
        text: &str,
        source: DocumentSource,
        session_id: &str,
        chunker: &ChunkerConfig,
        embedder: &dyn Embedder,
    ) -> Result<Self, RagError> {
        let pieces = chunk_text(text, chunker);
        if pieces.is_empty() {
            return Err(RagError::EmptyDocument(source));
        }

        let embeddings = embedder.embed(&pieces).await?;
        if embeddings.len() != pieces.len() {
            return Err(RagError::EmbeddingCount {
                expected: pieces.len(),
                got: embeddings.len(),
            });
        }

        let chunk_sizes: Vec<usize> = pieces.iter().map(|p| p.chars().count()).collect();
        let stats = IndexStats {
            chunks_count: pieces.len(),
            total_chars: text.chars().count(),
            avg_chunk_size: chunk_sizes.iter().sum::<usize>() as f64 / chunk_sizes.len() as f64,
            chunk_sizes,
        };

        let chunks = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(chunk_index, (text, embedding))| IndexedChunk {
                text,
                metadata: ChunkMetadata {
                    session_id: session_id.to_string(),
                    chunk_index,
                    source,
                },
                embedding,
            })
            .collect();

        Ok(Self {
            chunks,
            stats,
        })
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-`k` chunks by cosine similarity, best first. Ties keep chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                chunk,
                similarity: cosine_similarity(query, &chunk.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        scored
    }

    /// Similarity of the closest chunk, or 0 for an empty index.
    pub fn best_similarity(&self, query: &[f32]) -> f32 {
        self.search(query, 1)
            .first()
            .map(|s| s.similarity)
            .unwrap_or(0.0)
    }
}

/// Cosine similarity clamped to [0, 1]. Zero-length or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embedder::testing::VocabularyEmbedder;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_negative_is_clamped() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_and_search() {
        let embedder = VocabularyEmbedder::new(&["rust", "python", "kitchen"]);
        let text = "Built Rust services.\n\nWrote Python scripts.\n\nManaged a kitchen.";
        let chunker = ChunkerConfig {
            chunk_size: 25,
            chunk_overlap: 0,
            ..ChunkerConfig::default()
        };
        let index = VectorIndex::build(text, DocumentSource::Cv, "s1", &chunker, &embedder)
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.stats().chunks_count, 3);
        assert_eq!(index.stats().total_chars, text.chars().count());

        let hits = index.search(&[0.0, 1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "Wrote Python scripts.");
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(hits[0].chunk.metadata.chunk_index, 1);
        assert_eq!(hits[0].chunk.metadata.session_id, "s1");
    }

    #[tokio::test]
    async fn test_blank_document_is_rejected() {
        let embedder = VocabularyEmbedder::new(&["rust"]);
        let result = VectorIndex::build(
            "   ",
            DocumentSource::Jd,
            "s1",
            &ChunkerConfig::default(),
            &embedder,
        )
        .await;
        assert!(matches!(
            result,
            Err(RagError::EmptyDocument(DocumentSource::Jd))
        ));
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_metadata_serializes_source_as_type() {
        let meta = ChunkMetadata {
            session_id: "abc".to_string(),
            chunk_index: 2,
            source: DocumentSource::Jd,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "jd");
        assert_eq!(json["chunk_index"], 2);
    }
}
