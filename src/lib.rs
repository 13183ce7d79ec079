//! # OpenTex Service Layer
//!
//! A self-hosted LaTeX project server. Projects are directories of source
//! files under a single root; the service compiles them to PDF with an external
//! typesetter and publishes them to a git remote with a stored SSH key.
//!
//! ## Architecture
//!
//! The service layer provides:
//! - Name sanitization and confinement of every path to the project root
//! - Project and file CRUD
//! - Zip archive import into a fresh project
//! - Two-pass PDF builds judged by the artifact on disk
//! - A fixed git publish sequence using the stored credential
//!
//! The HTTP API in [`http`] and the `opentex` binary are thin layers over
//! [`ProjectService`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use opentex::{ProjectService, ServiceConfig};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig {
//!         projects_dir: PathBuf::from("./projects"),
//!         ..Default::default()
//!     };
//!
//!     let service = ProjectService::new(config)?;
//!
//!     let project = service.store().create_project("My Paper").await?;
//!     let build = service.compile(project.as_str(), "document.tex").await?;
//!     println!("PDF at {}", build.artifact_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod execution;
pub mod http;
pub mod security;
pub mod storage;

pub use core::build::{BuildConfig, BuildOutput, BuildRunner};
pub use core::publish::{PublishConfig, PublishResult, PublishRunner, StepResult};
pub use core::service::{GitStatus, ProjectService, ServiceConfig, ServiceError};
pub use execution::{ExecutionError, SystemToolRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use security::{sanitize, FileName, PathResolver, PathSecurityError, ProjectName, SafeName};
pub use storage::{ArchiveImporter, CredentialStore, GitCredential, ImportReport, ProjectStore};

/// Version of the service layer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the service layer (safe for testing)
pub fn init_logging() {
    init_logging_with_default("opentex=info");
}

/// Initialize logging with `directive` as the filter when `RUST_LOG` is unset
pub fn init_logging_with_default(directive: &str) {
    // Only initialize logging once
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| directive.into());

        // stdout is reserved for command output
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();

        // This will fail silently if already initialized
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_service_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            projects_dir: temp_dir.path().join("projects"),
            credentials_dir: temp_dir.path().join("git_config"),
            ..Default::default()
        };

        let service = ProjectService::new(config).unwrap();
        assert!(service.store().list_projects().await.unwrap().is_empty());
        assert!(service.store().resolver().root().is_absolute());
    }
}
