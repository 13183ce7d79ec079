//! Request and response models for the HTTP API

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Generic API response wrapper
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: ErrorResponse) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Error half of [`ApiResponse`], built by `HttpError`
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Project creation request
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// File creation request
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateFileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub content: String,
}

/// Compile request; also the query of `/api/download_pdf`
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CompileRequest {
    #[validate(length(min = 1, max = 255))]
    pub project: String,

    #[validate(length(min = 1, max = 255))]
    pub file: String,
}

/// `?file=` selector for file deletion
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct FileQuery {
    #[validate(length(min = 1, max = 255))]
    pub file: String,
}

/// Project list response
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsListResponse {
    pub projects: Vec<String>,
    pub count: usize,
}

/// Files of one project
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilesResponse {
    pub project: String,
    pub files: Vec<String>,
}

/// A project or file that was created, saved or deleted
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChangeResponse {
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

/// Status response
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub projects_count: usize,
    pub projects_path: String,
    pub typesetter: String,
    pub git_configured: bool,
    pub uptime_seconds: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_content_defaults_to_empty() {
        let request: CreateFileRequest =
            serde_json::from_str(r#"{"name":"refs.bib"}"#).unwrap();
        assert_eq!(request.content, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_names_fail_validation() {
        let request = CompileRequest {
            project: String::new(),
            file: "main.tex".to_string(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("project"));
    }
}
