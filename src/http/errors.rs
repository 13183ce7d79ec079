//! HTTP error handling and conversion

use crate::core::service::ServiceError;
use crate::http::models::{ApiResponse, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;

/// HTTP error types
#[derive(Debug, Clone)]
pub enum HttpError {
    /// Validation errors
    BadRequest(String),
    ValidationError(HashMap<String, Vec<String>>),

    /// Not found errors
    NotFound(String),

    /// Conflict errors
    Conflict(String),

    /// The request was understood but the typesetter could not produce a PDF
    UnprocessableEntity {
        message: String,
        details: serde_json::Value,
    },

    /// An external tool is missing on this host
    ServiceUnavailable(String),

    /// Server errors
    InternalServerError(String),
}

impl HttpError {
    /// Convert to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) | HttpError::ValidationError(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            HttpError::BadRequest(_) => "BAD_REQUEST",
            HttpError::ValidationError(_) => "VALIDATION_ERROR",
            HttpError::NotFound(_) => "NOT_FOUND",
            HttpError::Conflict(_) => "CONFLICT",
            HttpError::UnprocessableEntity { .. } => "COMPILATION_FAILED",
            HttpError::ServiceUnavailable(_) => "TOOL_UNAVAILABLE",
            HttpError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            HttpError::ValidationError(errors) => {
                write!(f, "Validation Error: {:?}", errors)
            }
            HttpError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            HttpError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            HttpError::UnprocessableEntity { message, .. } => {
                write!(f, "Unprocessable Entity: {}", message)
            }
            HttpError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            HttpError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        let (message, details) = match self {
            HttpError::ValidationError(errors) => {
                ("Validation failed".to_string(), Some(json!(errors)))
            }
            HttpError::UnprocessableEntity { message, details } => (message, Some(details)),
            HttpError::BadRequest(msg)
            | HttpError::NotFound(msg)
            | HttpError::Conflict(msg)
            | HttpError::ServiceUnavailable(msg)
            | HttpError::InternalServerError(msg) => (msg, None),
        };

        let body = ApiResponse::<()>::error(ErrorResponse {
            code: error_code.to_string(),
            message,
            details,
        });

        (status, Json(body)).into_response()
    }
}

/// Convert service errors to HTTP errors
impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidName(msg) => HttpError::BadRequest(msg),
            ServiceError::InvalidArchive(msg) => HttpError::BadRequest(msg),
            ServiceError::NotFound(msg) => HttpError::NotFound(msg),
            ServiceError::AlreadyExists(msg) => HttpError::Conflict(msg),
            ServiceError::BuildFailed { file, diagnostics } => HttpError::UnprocessableEntity {
                message: format!("Compilation of {} failed", file),
                details: json!({ "file": file, "log": diagnostics }),
            },
            ServiceError::ToolUnavailable(msg) => HttpError::ServiceUnavailable(msg),
            ServiceError::PublishPartial(msg) | ServiceError::Config(msg) => {
                HttpError::InternalServerError(msg)
            }
            ServiceError::Io(err) => HttpError::InternalServerError(err.to_string()),
        }
    }
}

/// Flatten `validator` errors into field -> messages
impl From<validator::ValidationErrors> for HttpError {
    fn from(errors: validator::ValidationErrors) -> Self {
        HttpError::ValidationError(
            errors
                .field_errors()
                .into_iter()
                .map(|(field, errors)| {
                    (
                        field.to_string(),
                        errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .clone()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }
}

/// Result type alias for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::InvalidName("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidArchive("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (
                ServiceError::BuildFailed {
                    file: "main.tex".into(),
                    diagnostics: "! Undefined control sequence.".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::ToolUnavailable("pdflatex".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ServiceError::PublishPartial("'git push -u origin main' exited 128".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Io(std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_build_failure_carries_log() {
        let err = HttpError::from(ServiceError::BuildFailed {
            file: "main.tex".into(),
            diagnostics: "! Missing $ inserted.".into(),
        });
        match err {
            HttpError::UnprocessableEntity { details, .. } => {
                assert_eq!(details["log"], "! Missing $ inserted.");
                assert_eq!(details["file"], "main.tex");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_error_body_envelope() {
        let response = HttpError::NotFound("project 'ghost'".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "project 'ghost'");
        assert!(body["error"]["details"].is_null());
        assert!(body.get("data").is_none());
    }
}
