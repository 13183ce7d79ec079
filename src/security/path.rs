//! Confined path resolution for projects, files and build artifacts

use crate::security::name::{sanitize, FileName, ProjectName, SafeName};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathSecurityError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path escapes its parent directory: {0}")]
    EscapesRoot(String),
}

/// Check that `child` is exactly one normal component below `parent`.
///
/// Sanitized names never contain separators, so this only fails when a caller
/// joins something that did not come out of the sanitizer.
pub fn ensure_direct_child(parent: &Path, child: &Path) -> Result<(), PathSecurityError> {
    let last_is_normal = matches!(child.components().next_back(), Some(Component::Normal(_)));
    if !last_is_normal || child.parent() != Some(parent) {
        return Err(PathSecurityError::EscapesRoot(format!(
            "'{}' is not a direct child of '{}'",
            child.display(),
            parent.display()
        )));
    }
    Ok(())
}

/// Join a sanitized name onto `dir`, re-validating confinement
pub fn confined_join(dir: &Path, name: &SafeName) -> Result<PathBuf, PathSecurityError> {
    let joined = dir.join(name.as_str());
    ensure_direct_child(dir, &joined)?;
    Ok(joined)
}

/// Build artifact for a source file: same directory, extension replaced by `.pdf`
pub fn artifact_path(file_path: &Path) -> PathBuf {
    file_path.with_extension("pdf")
}

/// Resolves project, file and artifact paths under a single store root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create the root if needed and canonicalize it so resolved paths are absolute
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, project: &ProjectName) -> Result<PathBuf, PathSecurityError> {
        confined_join(&self.root, project)
    }

    pub fn file_path(
        &self,
        project: &ProjectName,
        file: &FileName,
    ) -> Result<PathBuf, PathSecurityError> {
        let project_dir = self.project_dir(project)?;
        confined_join(&project_dir, file)
    }

    /// Sanitize a raw project name and resolve its directory
    pub fn resolve_project(&self, raw: &str) -> Result<(ProjectName, PathBuf), PathSecurityError> {
        let project = sanitize(raw)
            .ok_or_else(|| PathSecurityError::InvalidPath(format!("project name '{}'", raw)))?;
        let dir = self.project_dir(&project)?;
        Ok((project, dir))
    }

    /// Sanitize a raw (project, file) pair and resolve the file path
    pub fn resolve_file(
        &self,
        raw_project: &str,
        raw_file: &str,
    ) -> Result<(ProjectName, FileName, PathBuf), PathSecurityError> {
        let (project, _) = self.resolve_project(raw_project)?;
        let file = sanitize(raw_file)
            .ok_or_else(|| PathSecurityError::InvalidPath(format!("file name '{}'", raw_file)))?;
        let path = self.file_path(&project, &file)?;
        Ok((project, file, path))
    }
}
