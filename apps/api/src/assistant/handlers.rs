//! Axum route handlers for the conversational assistant and session management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::assistant::agent::{AssistantAgent, AssistantInput, AssistantOutcome};
use crate::cv::handlers::session_or_default;
use crate::errors::AppError;
use crate::llm_client::prompts::Language;
use crate::models::conversation::ChatTurn;
use crate::state::AppState;

const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub request: String,
    #[serde(default)]
    pub original_cv: String,
    #[serde(default)]
    pub optimized_cv: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub cv_skills: Vec<String>,
    #[serde(default)]
    pub job_skills: Vec<String>,
    /// Either a plain list or a previous comparison result carrying a `matched` list.
    #[serde(default)]
    pub matched_skills: Value,
    pub api_key: Option<String>,
    pub session_id: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: AssistantOutcome,
}

fn matched_list(value: &Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("matched") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// POST /api/assistant
pub async fn handle_assistant(
    State(state): State<AppState>,
    Json(body): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, AppError> {
    let params = state.llm.params(
        body.api_key.as_deref(),
        body.model.as_deref(),
        body.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    )?;
    if body.request.trim().is_empty() {
        return Err(AppError::validation("User request is required"));
    }
    if body.optimized_cv.trim().is_empty() {
        return Err(AppError::validation("Optimized CV is required"));
    }

    let input = AssistantInput {
        matched_skills: matched_list(&body.matched_skills),
        request: body.request,
        original_cv: body.original_cv,
        optimized_cv: body.optimized_cv,
        job_description: body.job_description,
        cv_skills: body.cv_skills,
        job_skills: body.job_skills,
        language: Language::from_code(body.language.as_deref()),
        session_id: session_or_default(body.session_id),
    };

    let embedder = state.embedder(&params.api_key);
    let agent = AssistantAgent {
        llm: &state.llm,
        params: &params,
        rag: &state.rag,
        embedder: &embedder,
        conversations: &state.conversations,
    };

    let outcome = agent.run(&input).await?;

    Ok(Json(AssistantResponse {
        success: true,
        outcome,
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<ChatTurn>,
}

/// GET /api/assistant/:session_id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<HistoryResponse> {
    let turns = state.conversations.history(&session_id);
    Json(HistoryResponse { session_id, turns })
}

/// DELETE /api/sessions/:session_id
///
/// Drops the session's conversation history and vector indexes.
pub async fn handle_clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    let had_history = state.conversations.clear(&session_id);
    let had_indexes = state.rag.clear(&session_id);
    info!(session = %session_id, had_history, had_indexes, "session cleared");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matched_list_accepts_list_or_comparison() {
        assert_eq!(matched_list(&json!(["Rust", 3, "SQL"])), vec!["Rust", "SQL"]);
        assert_eq!(
            matched_list(&json!({"matched": ["Go"], "cv_only": ["Java"]})),
            vec!["Go"]
        );
        assert!(matched_list(&Value::Null).is_empty());
        assert!(matched_list(&json!({"other": 1})).is_empty());
    }
}
