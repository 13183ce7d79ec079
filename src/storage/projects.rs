//! Filesystem-backed project store: one directory per project under a root

use crate::core::service::ServiceError;
use crate::security::{artifact_path, confined_join, sanitize, FileName, PathResolver, ProjectName};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// File created in every new project
pub const DEFAULT_DOCUMENT: &str = "document.tex";

/// Starter document for a new project. The title keeps the name as typed.
pub fn default_document(raw_title: &str, project: &ProjectName) -> String {
    format!(
        "\\documentclass{{article}}\n\
         \\title{{{raw_title}}}\n\
         \\author{{OpenTex Editor}}\n\
         \\date{{\\today}}\n\
         \n\
         \\begin{{document}}\n\
         \\maketitle\n\
         \\section{{Intro}}\n\
         This is a new project: {project}\n\
         \\end{{document}}"
    )
}

fn is_tex(name: &str) -> bool {
    name.ends_with(".tex")
}

pub struct ProjectStore {
    resolver: PathResolver,
}

impl ProjectStore {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Resolve a raw name to an existing project directory
    pub async fn existing_project(
        &self,
        raw_project: &str,
    ) -> Result<(ProjectName, PathBuf), ServiceError> {
        let (project, dir) = self.resolver.resolve_project(raw_project)?;
        if !is_dir(&dir).await {
            return Err(ServiceError::NotFound(format!("project '{}'", project)));
        }
        Ok((project, dir))
    }

    /// Resolve a raw (project, file) pair inside an existing project
    async fn file_in_project(
        &self,
        raw_project: &str,
        raw_file: &str,
    ) -> Result<(ProjectName, FileName, PathBuf), ServiceError> {
        let (project, dir) = self.existing_project(raw_project).await?;
        let file = sanitize(raw_file)
            .ok_or_else(|| ServiceError::InvalidName(format!("file name '{}'", raw_file)))?;
        let path = confined_join(&dir, &file)?;
        Ok((project, file, path))
    }

    /// Names of all project directories, sorted
    pub async fn list_projects(&self) -> Result<Vec<String>, ServiceError> {
        let mut entries = fs::read_dir(self.resolver.root()).await?;
        let mut projects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                projects.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        projects.sort();
        Ok(projects)
    }

    /// Create a project directory holding the starter document
    pub async fn create_project(&self, raw_name: &str) -> Result<ProjectName, ServiceError> {
        let (project, dir) = self.resolver.resolve_project(raw_name)?;
        if fs::try_exists(&dir).await? {
            return Err(ServiceError::AlreadyExists(format!("project '{}'", project)));
        }
        fs::create_dir(&dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ServiceError::AlreadyExists(format!("project '{}'", project))
            } else {
                ServiceError::Io(e)
            }
        })?;
        fs::write(
            dir.join(DEFAULT_DOCUMENT),
            default_document(raw_name, &project),
        )
        .await?;

        info!("Created project {}", project);
        Ok(project)
    }

    pub async fn delete_project(&self, raw_name: &str) -> Result<ProjectName, ServiceError> {
        let (project, dir) = self.existing_project(raw_name).await?;
        fs::remove_dir_all(&dir).await?;
        info!("Deleted project {}", project);
        Ok(project)
    }

    /// Regular files of a project: `.tex` sources first, then everything else
    pub async fn list_files(
        &self,
        raw_project: &str,
    ) -> Result<(ProjectName, Vec<String>), ServiceError> {
        let (project, dir) = self.existing_project(raw_project).await?;
        let mut entries = fs::read_dir(&dir).await?;
        let mut sources = Vec::new();
        let mut others = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_tex(&name) {
                sources.push(name);
            } else {
                others.push(name);
            }
        }
        sources.sort();
        others.sort();
        sources.extend(others);
        Ok((project, sources))
    }

    /// Create a new file; never overwrites
    pub async fn create_file(
        &self,
        raw_project: &str,
        raw_file: &str,
        content: &str,
    ) -> Result<(ProjectName, FileName), ServiceError> {
        let (project, file, path) = self.file_in_project(raw_project, raw_file).await?;
        if fs::try_exists(&path).await? {
            return Err(ServiceError::AlreadyExists(format!("file '{}'", file)));
        }
        fs::write(&path, content).await?;
        info!("Created {}/{}", project, file);
        Ok((project, file))
    }

    pub async fn read_file(
        &self,
        raw_project: &str,
        raw_file: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        let (_, file, path) = self.file_in_project(raw_project, raw_file).await?;
        if !is_file(&path).await {
            return Err(ServiceError::NotFound(format!("file '{}'", file)));
        }
        Ok(fs::read(&path).await?)
    }

    /// Overwrite or create a file in an existing project
    pub async fn save_file(
        &self,
        raw_project: &str,
        raw_file: &str,
        content: &[u8],
    ) -> Result<(ProjectName, FileName), ServiceError> {
        let (project, file, path) = self.file_in_project(raw_project, raw_file).await?;
        if is_dir(&path).await {
            return Err(ServiceError::InvalidName(format!(
                "'{}' is a directory",
                file
            )));
        }
        fs::write(&path, content).await?;
        Ok((project, file))
    }

    pub async fn delete_file(
        &self,
        raw_project: &str,
        raw_file: &str,
    ) -> Result<(ProjectName, FileName), ServiceError> {
        let (project, file, path) = self.file_in_project(raw_project, raw_file).await?;
        if !is_file(&path).await {
            return Err(ServiceError::NotFound(format!("file '{}'", file)));
        }
        fs::remove_file(&path).await?;
        info!("Deleted {}/{}", project, file);
        Ok((project, file))
    }

    /// Existing PDF built from `raw_file`
    pub async fn artifact(
        &self,
        raw_project: &str,
        raw_file: &str,
    ) -> Result<PathBuf, ServiceError> {
        let (_, _, path) = self.file_in_project(raw_project, raw_file).await?;
        let pdf = artifact_path(&path);
        if !is_file(&pdf).await {
            return Err(ServiceError::NotFound(
                "PDF not found. Please compile first.".to_string(),
            ));
        }
        Ok(pdf)
    }
}

async fn is_dir(path: &std::path::Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn is_file(path: &std::path::Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
