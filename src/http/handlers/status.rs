//! Status endpoint handler

use crate::core::service::ProjectService;
use crate::http::errors::HttpResult;
use crate::http::models::{ApiResponse, StatusResponse};
use axum::extract::State;
use std::sync::Arc;
use std::time::SystemTime;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProjectService>,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(service: Arc<ProjectService>) -> Self {
        Self {
            service,
            start_time: SystemTime::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_secs()
    }
}

/// GET /api/status - Service status endpoint
pub async fn status(
    State(state): State<AppState>,
) -> HttpResult<axum::Json<ApiResponse<StatusResponse>>> {
    let projects = state.service.store().list_projects().await?;
    let git = state.service.git_status().await?;
    let config = state.service.config();

    let response = StatusResponse {
        status: "running".to_string(),
        version: crate::VERSION.to_string(),
        projects_count: projects.len(),
        projects_path: state
            .service
            .store()
            .resolver()
            .root()
            .to_string_lossy()
            .to_string(),
        typesetter: config.build.program.clone(),
        git_configured: git.configured,
        uptime_seconds: state.uptime_seconds(),
    };

    Ok(axum::Json(ApiResponse::success(response)))
}
