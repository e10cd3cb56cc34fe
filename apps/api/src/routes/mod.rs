pub mod health;


use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{delete, get, post},
    Router,
};

use crate::assistant::handlers as assistant;
use crate::cv::handlers as cv;
use crate::documents::handlers as documents;
use crate::errors::AppError;
use crate::letter::handlers as letter;
use crate::skills::handlers as skills;
use crate::state::AppState;

/// Room for multipart framing around a maximum-size upload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route("/api/upload", post(documents::handle_upload))
        .route("/api/parse-pdf", post(documents::handle_upload))
        .route("/api/download-pdf", post(documents::handle_download_pdf))
        // CV optimization
        .route("/api/optimize-cv", post(cv::handle_optimize_cv))
        // Skills
        .route("/api/extract-skills", post(skills::handle_extract_skills))
        .route("/api/match-skills", post(skills::handle_match_skills))
        // Cover letter
        .route("/api/generate-letter", post(letter::handle_generate_letter))
        // Assistant and sessions
        .route("/api/assistant", post(assistant::handle_assistant))
        .route(
            "/api/assistant/:session_id/history",
            get(assistant::handle_history),
        )
        .route(
            "/api/sessions/:session_id",
            delete(assistant::handle_clear_session),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
