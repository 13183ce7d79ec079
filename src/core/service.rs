//! Main OpenTex service implementation

use crate::core::build::{BuildConfig, BuildOutput, BuildRunner};
use crate::core::publish::{PublishConfig, PublishResult, PublishRunner};
use crate::execution::{SystemToolRunner, ToolRunner};
use crate::security::{PathResolver, PathSecurityError};
use crate::storage::{ArchiveImporter, CredentialStore, GitCredential, ImportReport, ProjectStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Main service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root holding one directory per project
    pub projects_dir: PathBuf,

    /// Directory for the git key pair and identity; must lie outside `projects_dir`
    pub credentials_dir: PathBuf,

    /// Typesetter configuration
    pub build: BuildConfig,

    /// Git publishing configuration
    pub publish: PublishConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from("./projects"),
            credentials_dir: PathBuf::from("./git_config"),
            build: BuildConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Compilation of {file} failed")]
    BuildFailed { file: String, diagnostics: String },

    #[error("Publish incomplete: {0}")]
    PublishPartial(String),

    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<PathSecurityError> for ServiceError {
    fn from(err: PathSecurityError) -> Self {
        ServiceError::InvalidName(err.to_string())
    }
}

/// Stored git identity as reported to clients; never includes key material
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub configured: bool,
    pub host: Option<String>,
    pub username: Option<String>,
    pub has_public_key: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Option<GitCredential>> for GitStatus {
    fn from(credential: Option<GitCredential>) -> Self {
        match credential {
            Some(c) => Self {
                configured: true,
                has_public_key: c.public_key_path.is_some(),
                host: Some(c.host),
                username: Some(c.username),
                updated_at: c.updated_at,
            },
            None => Self {
                configured: false,
                host: None,
                username: None,
                has_public_key: false,
                updated_at: None,
            },
        }
    }
}

/// Main OpenTex service
///
/// Owns the project store and the runners for the external tools. Every
/// operation takes raw names and sanitizes them before touching the filesystem.
pub struct ProjectService {
    config: ServiceConfig,
    store: ProjectStore,
    importer: ArchiveImporter,
    credentials: CredentialStore,
    builder: BuildRunner,
    publisher: PublishRunner,
}

impl ProjectService {
    /// Create a service that runs the real typesetter and git binaries
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        Self::with_tool_runner(config, Arc::new(SystemToolRunner))
    }

    /// Create a service whose external tools go through `runner`
    pub fn with_tool_runner(
        config: ServiceConfig,
        runner: Arc<dyn ToolRunner>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing OpenTex service v{}", crate::VERSION);

        let resolver = PathResolver::open(&config.projects_dir).map_err(|e| {
            ServiceError::Config(format!(
                "projects directory {}: {}",
                config.projects_dir.display(),
                e
            ))
        })?;
        let credentials_dir = absolute(&config.credentials_dir)?;
        if credentials_dir.starts_with(resolver.root()) {
            return Err(ServiceError::Config(format!(
                "credentials directory {} must be outside the projects directory {}",
                credentials_dir.display(),
                resolver.root().display()
            )));
        }
        info!("Projects stored in {}", resolver.root().display());

        Ok(Self {
            store: ProjectStore::new(resolver.clone()),
            importer: ArchiveImporter::new(resolver),
            credentials: CredentialStore::new(credentials_dir),
            builder: BuildRunner::new(config.build.clone(), runner.clone()),
            publisher: PublishRunner::new(config.publish.clone(), runner),
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Project and file CRUD
    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Create a project from an uploaded zip archive
    pub async fn import_archive(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportReport, ServiceError> {
        let importer = self.importer.clone();
        let file_name = file_name.to_string();
        tokio::task::spawn_blocking(move || importer.import(&file_name, &bytes))
            .await
            .map_err(|e| ServiceError::Io(std::io::Error::other(e)))?
    }

    /// Compile a source file of an existing project to PDF
    pub async fn compile(
        &self,
        raw_project: &str,
        raw_file: &str,
    ) -> Result<BuildOutput, ServiceError> {
        let (_, dir) = self.store.existing_project(raw_project).await?;
        let (_, file, _) = self.store.resolver().resolve_file(raw_project, raw_file)?;
        self.builder.compile(&dir, &file).await
    }

    /// Commit and push an existing project with the stored credential
    pub async fn publish(&self, raw_project: &str) -> Result<PublishResult, ServiceError> {
        let (project, dir) = self.store.existing_project(raw_project).await?;
        let credential = self
            .credentials
            .load_latest()
            .await?
            .ok_or_else(|| ServiceError::NotFound("git credential".to_string()))?;
        credential.validate()?;
        Ok(self.publisher.publish(&dir, &credential, &project).await)
    }

    /// Replace the stored git identity and key pair
    pub async fn configure_git(
        &self,
        host: &str,
        username: &str,
        private_key: &[u8],
        public_key: Option<&[u8]>,
    ) -> Result<GitCredential, ServiceError> {
        self.credentials
            .save(host, username, private_key, public_key)
            .await
    }

    pub async fn git_status(&self) -> Result<GitStatus, ServiceError> {
        Ok(self.credentials.load_latest().await?.into())
    }
}

/// Absolute form of `path` with its longest existing prefix canonicalized
fn absolute(path: &Path) -> Result<PathBuf, ServiceError> {
    let config_error =
        |e: std::io::Error| ServiceError::Config(format!("directory {}: {}", path.display(), e));
    let path = std::path::absolute(path).map_err(config_error)?;

    let mut missing = Vec::new();
    let mut existing = path.as_path();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Ok(missing.into_iter().rev().fold(canonical, |acc, part| acc.join(part)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(path),
        }
    }
}
