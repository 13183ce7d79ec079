//! Git configuration and publish handlers

use crate::core::publish::PublishResult;
use crate::core::service::GitStatus;
use crate::http::errors::{HttpError, HttpResult};
use crate::http::handlers::AppState;
use crate::http::models::ApiResponse;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::collections::HashMap;

/// GET /api/git/config - Stored identity, without key material
pub async fn get_git_config(
    State(state): State<AppState>,
) -> HttpResult<Json<ApiResponse<GitStatus>>> {
    let status = state.service.git_status().await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/git/config - Replace identity and key pair
///
/// Multipart fields: `host`, `username`, `private_key` (file) and an optional
/// `public_key` (file).
pub async fn set_git_config(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> HttpResult<Json<ApiResponse<GitStatus>>> {
    let mut host = None;
    let mut username = None;
    let mut private_key = None;
    let mut public_key = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::BadRequest(format!("Failed to read field '{}': {}", name, e)))?;
        match name.as_str() {
            "host" => host = Some(String::from_utf8_lossy(&data).to_string()),
            "username" => username = Some(String::from_utf8_lossy(&data).to_string()),
            "private_key" => private_key = Some(data.to_vec()),
            "public_key" => public_key = Some(data.to_vec()),
            _ => {}
        }
    }

    let mut missing: HashMap<String, Vec<String>> = HashMap::new();
    for (field, present) in [
        ("host", host.is_some()),
        ("username", username.is_some()),
        ("private_key", private_key.is_some()),
    ] {
        if !present {
            missing.insert(field.to_string(), vec!["required".to_string()]);
        }
    }
    let (Some(host), Some(username), Some(private_key)) = (host, username, private_key) else {
        return Err(HttpError::ValidationError(missing));
    };

    state
        .service
        .configure_git(&host, &username, &private_key, public_key.as_deref())
        .await?;
    let status = state.service.git_status().await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/projects/:project/git_push - Commit and push with the stored key
///
/// A failed push is still a 200: the step list is the useful part of the answer.
pub async fn git_push(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> HttpResult<Json<ApiResponse<PublishResult>>> {
    let result = state.service.publish(&project).await?;
    Ok(Json(ApiResponse::success(result)))
}
