//! Axum route handlers for file upload and PDF download.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::documents::extract::{extract_text, word_count, DocumentError, DocumentKind};
use crate::documents::layout::layout_cv;
use crate::documents::render::render_pdf;
use crate::errors::AppError;
use crate::state::AppState;

const FILE_FIELD: &str = "file";
const PDF_FILENAME: &str = "optimized_cv.pdf";
const MIB: usize = 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
    pub filename: String,
    pub size: usize,
    pub word_count: usize,
}

/// POST /api/upload and POST /api/parse-pdf
///
/// Reads the `file` multipart field and returns its extracted text.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let limit = state.config.max_upload_bytes;
    let (filename, data) = read_file_field(&mut multipart, limit).await?;

    if data.len() > limit {
        return Err(too_large(limit));
    }
    // Reject before spending a blocking thread on it.
    DocumentKind::from_filename(&filename)?;

    let size = data.len();
    let name = filename.clone();
    let text = tokio::task::spawn_blocking(move || extract_text(&name, &data))
        .await
        .map_err(|e| DocumentError::Unreadable(format!("extraction aborted: {e}")))??;

    info!(filename = %filename, size, "extracted upload text");

    Ok(Json(UploadResponse {
        word_count: word_count(&text),
        text,
        filename,
        size,
    }))
}

fn too_large(limit: usize) -> AppError {
    let max = if limit >= MIB {
        format!("{} MB", limit / MIB)
    } else {
        format!("{} KB", limit.div_ceil(1024))
    };
    AppError::validation(format!("File too large. Maximum size is {max}"))
}

/// Body-limit overruns surface as multipart errors; report them like any oversized file.
fn multipart_error(e: MultipartError, limit: usize, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(limit)
    } else {
        AppError::validation(format!("{context}: {e}"))
    }
}

async fn read_file_field(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit, "Invalid multipart body"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().trim().to_string();
        if filename.is_empty() {
            return Err(AppError::validation("No file selected"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit, "Could not read upload"))?;
        return Ok((filename, data));
    }
    Err(AppError::validation("No file provided"))
}

#[derive(Debug, Deserialize)]
pub struct DownloadPdfRequest {
    #[serde(default)]
    pub cv_text: String,
}

/// POST /api/download-pdf
///
/// Renders the CV text with the Harvard layout and returns it as an attachment.
pub async fn handle_download_pdf(
    Json(request): Json<DownloadPdfRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.cv_text.trim().is_empty() {
        return Err(AppError::validation("CV text is required"));
    }

    let pdf = tokio::task::spawn_blocking(move || render_pdf(&layout_cv(&request.cv_text)))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed rendering PDF: {e}"))
        })??;

    info!(bytes = pdf.len(), "rendered CV PDF");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{PDF_FILENAME}\""),
            ),
        ],
        pdf,
    ))
}
