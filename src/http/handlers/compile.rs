//! Compile and PDF download handlers

use crate::http::errors::{HttpError, HttpResult};
use crate::http::handlers::AppState;
use crate::http::models::CompileRequest;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::IntoResponse,
    Json,
};
use std::path::Path;
use validator::Validate;

/// POST /api/compile - Build a PDF and return it inline
pub async fn compile(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> HttpResult<impl IntoResponse> {
    request.validate()?;

    let output = state
        .service
        .compile(&request.project, &request.file)
        .await?;
    pdf_response(&output.artifact_path, "inline").await
}

/// GET /api/download_pdf?project=..&file=.. - Previously built PDF as an attachment
pub async fn download_pdf(
    State(state): State<AppState>,
    Query(query): Query<CompileRequest>,
) -> HttpResult<impl IntoResponse> {
    query.validate()?;

    let pdf = state
        .service
        .store()
        .artifact(&query.project, &query.file)
        .await?;
    pdf_response(&pdf, "attachment").await
}

async fn pdf_response(path: &Path, disposition: &str) -> HttpResult<impl IntoResponse> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| HttpError::InternalServerError(format!("Failed to read PDF: {}", e)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());
    // artifact names come from sanitized file names, so they are plain ASCII
    let disposition = HeaderValue::from_str(&format!(
        "{}; filename=\"{}\"",
        disposition, file_name
    ))
    .map_err(|e| HttpError::InternalServerError(format!("Invalid file name header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
