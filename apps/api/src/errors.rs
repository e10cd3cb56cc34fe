use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::extract::DocumentError;
use crate::documents::render::PdfError;
use crate::llm_client::LlmError;
use crate::rag::RagError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("RAG error: {0}")]
    Rag(#[from] RagError),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

/// Status, code and user-facing message for a provider error.
fn llm_parts(e: &LlmError) -> (StatusCode, &'static str, String) {
    if matches!(e, LlmError::MissingApiKey) {
        return (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "API key is required".to_string(),
        );
    }
    tracing::error!("LLM error: {e}");
    let failure = e.failure();
    (
        failure.status(),
        failure.code(),
        failure.user_message().to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Document(e) => match e {
                DocumentError::UnsupportedType(_) => (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_FILE_TYPE",
                    e.to_string(),
                ),
                DocumentError::Unreadable(_) | DocumentError::Empty => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPROCESSABLE_ENTITY",
                    e.to_string(),
                ),
            },
            AppError::Llm(e) => llm_parts(e),
            AppError::Rag(RagError::Embedding(e)) => llm_parts(e),
            AppError::Rag(e) => {
                tracing::error!("RAG error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RAG_ERROR",
                    "A retrieval error occurred".to_string(),
                )
            }
            AppError::Pdf(e) => {
                tracing::error!("PDF error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF_ERROR",
                    "Failed to generate the PDF".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_validation_error() {
        let response = AppError::from(LlmError::MissingApiKey).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_provider_quota_maps_to_payment_required() {
        let err = AppError::from(LlmError::Api {
            status: 429,
            message: "You exceeded your current quota (insufficient_quota)".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn test_embedding_failure_uses_provider_mapping() {
        let err = AppError::from(RagError::Embedding(LlmError::Api {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        }));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_empty_document_is_unprocessable() {
        let response = AppError::from(DocumentError::Empty).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
