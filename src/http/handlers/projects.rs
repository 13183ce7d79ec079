//! Project endpoint handlers

use crate::http::errors::{HttpError, HttpResult};
use crate::http::handlers::AppState;
use crate::http::models::*;
use crate::storage::ImportReport;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

/// Multipart field carrying the uploaded archive
pub const UPLOAD_FIELD: &str = "project_zip";

/// GET /api/projects - List all projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> HttpResult<Json<ApiResponse<ProjectsListResponse>>> {
    let projects = state.service.store().list_projects().await?;
    Ok(Json(ApiResponse::success(ProjectsListResponse {
        count: projects.len(),
        projects,
    })))
}

/// POST /api/projects - Create a project with the starter document
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> HttpResult<(StatusCode, Json<ApiResponse<ProjectChangeResponse>>)> {
    request.validate()?;

    let project = state.service.store().create_project(&request.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProjectChangeResponse {
            project: project.to_string(),
            file: Some(crate::storage::DEFAULT_DOCUMENT.to_string()),
            message: format!("Project '{}' created", project),
        })),
    ))
}

/// POST /api/upload_zip - Create a project from a zip archive
pub async fn upload_zip(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> HttpResult<(StatusCode, Json<ApiResponse<ImportReport>>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| HttpError::BadRequest("Uploaded archive has no file name".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::BadRequest(format!("Failed to read file data: {}", e)))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) = upload.ok_or_else(|| {
        HttpError::BadRequest(format!("No '{}' file in multipart form", UPLOAD_FIELD))
    })?;
    info!("Received archive {} ({} bytes)", file_name, data.len());

    let report = state.service.import_archive(&file_name, data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(report))))
}

/// GET /api/projects/:project - Files of a project, sources first
pub async fn get_project(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> HttpResult<Json<ApiResponse<ProjectFilesResponse>>> {
    let (project, files) = state.service.store().list_files(&project).await?;
    Ok(Json(ApiResponse::success(ProjectFilesResponse {
        project: project.into_string(),
        files,
    })))
}

/// DELETE /api/projects/:project (also POST /api/projects/:project/delete)
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> HttpResult<Json<ApiResponse<ProjectChangeResponse>>> {
    let project = state.service.store().delete_project(&project).await?;
    Ok(Json(ApiResponse::success(ProjectChangeResponse {
        project: project.to_string(),
        file: None,
        message: format!("Project '{}' deleted", project),
    })))
}
