//! Axum route handlers for the Skills API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::skills::SkillsComparison;
use crate::rag::Embedder;
use crate::skills::extract::{extract_skills, TextKind};
use crate::skills::matcher::{compare_skills, InterestingProbe, MatchContext};
use crate::state::AppState;

const EXTRACT_TEMPERATURE: f32 = 0.2;
const MATCH_TEMPERATURE: f32 = 0.3;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractSkillsRequest {
    #[serde(default)]
    pub text: String,
    pub text_type: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct ExtractSkillsResponse {
    pub skills: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct MatchSkillsRequest {
    #[serde(default)]
    pub cv_skills: Vec<String>,
    #[serde(default)]
    pub job_skills: Vec<String>,
    pub api_key: Option<String>,
    #[serde(default)]
    pub cv_text: String,
    #[serde(default)]
    pub job_text: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Use the session's CV / job indexes for context and interesting-skill passes.
    pub session_id: Option<String>,
    /// Embed skills for semantic matching.
    #[serde(default)]
    pub semantic: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/extract-skills
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Json(request): Json<ExtractSkillsRequest>,
) -> Result<Json<ExtractSkillsResponse>, AppError> {
    let params = state.llm.params(
        request.api_key.as_deref(),
        request.model.as_deref(),
        request.temperature.unwrap_or(EXTRACT_TEMPERATURE),
    )?;
    if request.text.trim().is_empty() {
        return Err(AppError::validation("Text is required"));
    }

    let kind = TextKind::from_label(request.text_type.as_deref());
    let skills = extract_skills(&state.llm, &params, &request.text, kind).await?;

    Ok(Json(ExtractSkillsResponse {
        count: skills.len(),
        skills,
    }))
}

/// POST /api/match-skills
///
/// Heuristic matching always runs. Semantic matching runs when `semantic` is set; a
/// `session_id` with indexed documents additionally enables the context passes.
pub async fn handle_match_skills(
    State(state): State<AppState>,
    Json(request): Json<MatchSkillsRequest>,
) -> Result<Json<SkillsComparison>, AppError> {
    let params = state.llm.params(
        request.api_key.as_deref(),
        request.model.as_deref(),
        request.temperature.unwrap_or(MATCH_TEMPERATURE),
    )?;
    if request.cv_skills.is_empty() || request.job_skills.is_empty() {
        return Err(AppError::validation(
            "Both CV skills and job skills are required",
        ));
    }

    let session = request
        .session_id
        .as_deref()
        .map(|id| state.rag.session(id))
        .unwrap_or_default();
    let embedder = state.embedder(&params.api_key);
    let use_embeddings = request.semantic || !session.is_empty();

    let ctx = MatchContext {
        embedder: use_embeddings.then_some(&embedder as &dyn Embedder),
        cv_index: session.cv.as_deref(),
        jd_index: session.jd.as_deref(),
        probe: Some(InterestingProbe {
            llm: &state.llm,
            params: &params,
            cv_text: &request.cv_text,
            job_text: &request.job_text,
        }),
    };

    let comparison = compare_skills(&request.cv_skills, &request.job_skills, &ctx).await;

    Ok(Json(comparison))
}
