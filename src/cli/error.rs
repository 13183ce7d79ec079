//! CLI-specific error types

use opentex::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Validation(_) => 2,
            CliError::Service(ServiceError::BuildFailed { .. }) => 3,
            CliError::Service(ServiceError::PublishPartial(_)) => 4,
            CliError::Service(ServiceError::ToolUnavailable(_)) => 5,
            CliError::Service(ServiceError::Config(_)) => 2,
            CliError::Io(_) | CliError::Service(_) | CliError::Server(_) => 1,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
