//! File endpoint handlers

use crate::http::errors::HttpResult;
use crate::http::handlers::AppState;
use crate::http::models::*;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

/// GET /api/projects/:project/files - List files, sources first
pub async fn list_files(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> HttpResult<Json<ApiResponse<ProjectFilesResponse>>> {
    let (project, files) = state.service.store().list_files(&project).await?;
    Ok(Json(ApiResponse::success(ProjectFilesResponse {
        project: project.into_string(),
        files,
    })))
}

/// POST /api/projects/:project/files - Create a new file
pub async fn create_file(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Json(request): Json<CreateFileRequest>,
) -> HttpResult<(StatusCode, Json<ApiResponse<ProjectChangeResponse>>)> {
    request.validate()?;

    let (project, file) = state
        .service
        .store()
        .create_file(&project, &request.name, &request.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProjectChangeResponse {
            project: project.into_string(),
            message: format!("File '{}' created", file),
            file: Some(file.into_string()),
        })),
    ))
}

/// DELETE /api/projects/:project/files?file=<name>
pub async fn delete_file(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<FileQuery>,
) -> HttpResult<Json<ApiResponse<ProjectChangeResponse>>> {
    query.validate()?;

    let (project, file) = state.service.store().delete_file(&project, &query.file).await?;
    Ok(Json(ApiResponse::success(ProjectChangeResponse {
        project: project.into_string(),
        message: format!("File '{}' deleted", file),
        file: Some(file.into_string()),
    })))
}

/// GET /api/projects/:project/:file - Raw file content
pub async fn read_file(
    State(state): State<AppState>,
    Path((project, file)): Path<(String, String)>,
) -> HttpResult<impl IntoResponse> {
    let content = state.service.store().read_file(&project, &file).await?;
    let content_type = if std::str::from_utf8(&content).is_ok() {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    };
    Ok(([(header::CONTENT_TYPE, content_type)], content))
}

/// POST /api/projects/:project/:file - Save the raw request body
pub async fn save_file(
    State(state): State<AppState>,
    Path((project, file)): Path<(String, String)>,
    body: Bytes,
) -> HttpResult<Json<ApiResponse<ProjectChangeResponse>>> {
    let (project, file) = state.service.store().save_file(&project, &file, &body).await?;
    Ok(Json(ApiResponse::success(ProjectChangeResponse {
        project: project.into_string(),
        message: format!("File '{}' saved", file),
        file: Some(file.into_string()),
    })))
}
