use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::letter::generator::{generate_cover_letter, CoverLetter, LetterInput};
use crate::llm_client::prompts::Language;
use crate::state::AppState;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_LETTER_WORDS: u32 = 300;

#[derive(Debug, Deserialize)]
pub struct GenerateLetterRequest {
    #[serde(default)]
    pub cv_text: String,
    pub optimized_cv: Option<String>,
    #[serde(default)]
    pub job_description: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub letter_words: Option<u32>,
    pub language: Option<String>,
}

/// POST /api/generate-letter
pub async fn handle_generate_letter(
    State(state): State<AppState>,
    Json(request): Json<GenerateLetterRequest>,
) -> Result<Json<CoverLetter>, AppError> {
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

    let optimized_cv = request
        .optimized_cv
        .as_deref()
        .filter(|cv| !cv.trim().is_empty())
        .unwrap_or(&request.cv_text);

    let input = LetterInput {
        cv_text: &request.cv_text,
        optimized_cv,
        job_description: &request.job_description,
        target_words: request.letter_words.unwrap_or(DEFAULT_LETTER_WORDS),
        language: Language::from_code(request.language.as_deref()),
    };

    let letter = generate_cover_letter(&state.llm, &params, &input).await?;
    Ok(Json(letter))
}
