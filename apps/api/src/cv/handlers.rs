//! Axum route handlers for CV optimization.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::cv::pipeline::{CvOptimizer, OptimizeInput, OptimizeOutcome};
use crate::errors::AppError;
use crate::llm_client::prompts::Language;
use crate::state::AppState;

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MIN_EXPERIENCES: u32 = 3;
const DEFAULT_MAX_EXPERIENCES: u32 = 8;
pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Deserialize)]
pub struct OptimizeCvRequest {
    #[serde(default)]
    pub cv_text: String,
    #[serde(default)]
    pub job_description: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub min_experiences: Option<u32>,
    pub max_experiences: Option<u32>,
    pub max_date_years: Option<u32>,
    pub language: Option<String>,
    pub session_id: Option<String>,
}

/// POST /api/optimize-cv
///
/// Runs the seven-node optimization pipeline and returns the tailored CV with the
/// intermediate skills analysis, retrieval sources and agent log.
pub async fn handle_optimize_cv(
    State(state): State<AppState>,
    Json(request): Json<OptimizeCvRequest>,
) -> Result<Json<OptimizeOutcome>, AppError> {
    let params = state.llm.params(
        request.api_key.as_deref(),
        request.model.as_deref(),
        request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    )?;
    if request.cv_text.trim().is_empty() || request.job_description.trim().is_empty() {
        return Err(AppError::validation(
            "CV text and job description are required",
        ));
    }

    let min_experiences = request.min_experiences.unwrap_or(DEFAULT_MIN_EXPERIENCES);
    let max_experiences = request.max_experiences.unwrap_or(DEFAULT_MAX_EXPERIENCES);
    if min_experiences > max_experiences {
        return Err(AppError::validation(
            "min_experiences cannot exceed max_experiences",
        ));
    }

    let input = OptimizeInput {
        cv_text: request.cv_text,
        job_description: request.job_description,
        min_experiences,
        max_experiences,
        max_date_years: request.max_date_years,
        language: Language::from_code(request.language.as_deref()),
        session_id: session_or_default(request.session_id),
    };

    let embedder = state.embedder(&params.api_key);
    let optimizer = CvOptimizer {
        llm: &state.llm,
        params: &params,
        rag: &state.rag,
        embedder: &embedder,
    };

    let outcome = optimizer.run(&input).await?;

    Ok(Json(outcome))
}

/// Blank or missing session ids share the default session.
pub fn session_or_default(session_id: Option<String>) -> String {
    session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION.to_string())
}
