//! Per-session vector indexes.
//!
//! Each session holds at most one CV index and one job-description index. Indexes are
//! shared as `Arc<VectorIndex>` and cloned out of the map before any `.await`, so no
//! `DashMap` guard is ever held across a suspension point.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};

use super::chunker::ChunkerConfig;
use super::embedder::Embedder;
use super::index::{ChunkMetadata, DocumentSource, IndexStats, ScoredChunk, VectorIndex};
use super::RagError;

#[derive(Debug, Clone, Default)]
pub struct SessionIndex {
    pub cv: Option<Arc<VectorIndex>>,
    pub jd: Option<Arc<VectorIndex>>,
}

impl SessionIndex {
    pub fn is_empty(&self) -> bool {
        self.cv.is_none() && self.jd.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkDetail {
    /// 1-based rank within the result list.
    pub index: usize,
    pub content: String,
    pub similarity_score: f32,
    pub metadata: ChunkMetadata,
}

/// Retrieval result for one query against a session's CV and job indexes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievedContext {
    pub cv_context: String,
    pub jd_context: String,
    pub cv_sources: Vec<String>,
    pub jd_sources: Vec<String>,
    pub cv_chunks_details: Vec<ChunkDetail>,
    pub jd_chunks_details: Vec<ChunkDetail>,
    pub query: String,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.cv_sources.is_empty() && self.jd_sources.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RagStore {
    sessions: DashMap<String, SessionIndex>,
    chunker: ChunkerConfig,
}

impl RagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the CV for `session_id`, replacing any previous CV index.
    /// On failure the previous CV index is dropped as well.
    pub async fn index_cv(
        &self,
        session_id: &str,
        text: &str,
        embedder: &dyn Embedder,
    ) -> Result<IndexStats, RagError> {
        self.index(session_id, text, DocumentSource::Cv, embedder)
            .await
    }

    /// Indexes the job description for `session_id`, replacing any previous one.
    pub async fn index_jd(
        &self,
        session_id: &str,
        text: &str,
        embedder: &dyn Embedder,
    ) -> Result<IndexStats, RagError> {
        self.index(session_id, text, DocumentSource::Jd, embedder)
            .await
    }

    async fn index(
        &self,
        session_id: &str,
        text: &str,
        source: DocumentSource,
        embedder: &dyn Embedder,
    ) -> Result<IndexStats, RagError> {
        let index =
            match VectorIndex::build(text, source, session_id, &self.chunker, embedder).await {
                Ok(index) => index,
                Err(e) => {
                    if self.drop_source(session_id, source) {
                        warn!("Dropped stale {source} index for session {session_id}");
                    }
                    return Err(e);
                }
            };
        let stats = index.stats().clone();
        let index = Arc::new(index);

        let mut entry = self.sessions.entry(session_id.to_string()).or_default();
        match source {
            DocumentSource::Cv => entry.cv = Some(index),
            DocumentSource::Jd => entry.jd = Some(index),
        }
        drop(entry);

        info!(
            "Indexed {} for session {}: {} chunks",
            source, session_id, stats.chunks_count
        );
        Ok(stats)
    }

    fn drop_source(&self, session_id: &str, source: DocumentSource) -> bool {
        let Some(mut entry) = self.sessions.get_mut(session_id) else {
            return false;
        };
        let removed = match source {
            DocumentSource::Cv => entry.cv.take(),
            DocumentSource::Jd => entry.jd.take(),
        }
        .is_some();
        drop(entry);

        self.sessions.remove_if(session_id, |_, s| s.is_empty());
        removed
    }

    /// Snapshot of the session's indexes.
    pub fn session(&self, session_id: &str) -> SessionIndex {
        self.sessions
            .get(session_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Retrieves the `k_cv` / `k_jd` closest chunks for `query`.
    /// A session without indexes yields an empty context and makes no embedding call.
    pub async fn retrieve(
        &self,
        session_id: &str,
        query: &str,
        k_cv: usize,
        k_jd: usize,
        embedder: &dyn Embedder,
    ) -> Result<RetrievedContext, RagError> {
        let session = self.session(session_id);
        let mut context = RetrievedContext {
            query: query.to_string(),
            ..RetrievedContext::default()
        };
        if session.is_empty() {
            return Ok(context);
        }

        let query_vec = embedder.embed_one(query).await?;

        if let Some(cv) = &session.cv {
            let hits = cv.search(&query_vec, k_cv);
            context.cv_context = format_context(&hits);
            context.cv_sources = hits.iter().map(|h| h.chunk.text.clone()).collect();
            context.cv_chunks_details = details(&hits);
        }
        if let Some(jd) = &session.jd {
            let hits = jd.search(&query_vec, k_jd);
            context.jd_context = format_context(&hits);
            context.jd_sources = hits.iter().map(|h| h.chunk.text.clone()).collect();
            context.jd_chunks_details = details(&hits);
        }

        Ok(context)
    }

    /// Drops both indexes for the session. Returns whether anything was removed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }
}

fn format_context(hits: &[ScoredChunk<'_>]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("[Chunk {}]: {}", i + 1, h.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn details(hits: &[ScoredChunk<'_>]) -> Vec<ChunkDetail> {
    hits.iter()
        .enumerate()
        .map(|(i, h)| ChunkDetail {
            index: i + 1,
            content: h.chunk.text.clone(),
            similarity_score: h.similarity,
            metadata: h.chunk.metadata.clone(),
        })
        .collect()
}
