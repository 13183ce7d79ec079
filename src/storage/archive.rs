//! Zip upload import: one archive becomes one new project

use crate::core::service::ServiceError;
use crate::security::{confined_join, sanitize, PathResolver, ProjectName};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, error, info};
use zip::ZipArchive;

/// Cap on the buffer preallocated from an entry's declared size
const MAX_PREALLOCATION: usize = 1024 * 1024;

/// Largest decompressed size of a single entry
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Largest decompressed size of a whole archive
pub const MAX_TOTAL_BYTES: u64 = 256 * 1024 * 1024;

/// Decompression limits applied while extracting
#[derive(Debug, Clone, Copy)]
struct ExtractLimits {
    entry: u64,
    total: u64,
}

const DEFAULT_LIMITS: ExtractLimits = ExtractLimits {
    entry: MAX_ENTRY_BYTES,
    total: MAX_TOTAL_BYTES,
};

/// Result of a successful import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub project: ProjectName,
    /// Files written at the project root, sorted
    pub files: Vec<String>,
    /// Entries dropped as unsafe or unnamed
    pub skipped: usize,
}

/// Project name for an uploaded archive: its base name without `.zip`
pub fn project_name_from_archive(file_name: &str) -> Result<ProjectName, ServiceError> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = base
        .len()
        .checked_sub(4)
        .filter(|&idx| base.is_char_boundary(idx) && base[idx..].eq_ignore_ascii_case(".zip"))
        .map(|idx| &base[..idx])
        .ok_or_else(|| {
            ServiceError::InvalidArchive(format!("'{}' is not a .zip upload", file_name))
        })?;
    sanitize(stem).ok_or_else(|| {
        ServiceError::InvalidName(format!("archive name '{}' gives no valid project name", base))
    })
}

/// Base name of a file entry, or `None` if the entry path is unsafe.
///
/// Absolute paths, drive prefixes, NUL bytes and any `..` segment (with either
/// separator) disqualify the whole entry rather than being flattened away.
pub fn entry_base_name(raw: &str) -> Option<&str> {
    if raw.contains('\0') || raw.starts_with(['/', '\\']) {
        return None;
    }
    if raw.len() >= 2 && raw.as_bytes()[1] == b':' {
        return None;
    }
    if raw.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }
    raw.rsplit(['/', '\\']).next().filter(|name| !name.is_empty())
}

#[derive(Debug, Clone)]
pub struct ArchiveImporter {
    resolver: PathResolver,
}

impl ArchiveImporter {
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Create a project from a zip archive.
    ///
    /// The project directory is created up front and removed again if anything
    /// fails, so after an error no directory for the name is left behind.
    /// Blocking; run it off the async executor.
    pub fn import(&self, file_name: &str, bytes: &[u8]) -> Result<ImportReport, ServiceError> {
        let project = project_name_from_archive(file_name)?;
        let dir = self.resolver.project_dir(&project)?;
        if dir.symlink_metadata().is_ok() {
            return Err(ServiceError::AlreadyExists(format!("project '{}'", project)));
        }
        std::fs::create_dir(&dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ServiceError::AlreadyExists(format!("project '{}'", project))
            } else {
                ServiceError::Io(e)
            }
        })?;

        match extract_flat(&dir, bytes, DEFAULT_LIMITS) {
            Ok((files, skipped)) => {
                info!(
                    "Imported {} into project {} ({} files, {} skipped)",
                    file_name,
                    project,
                    files.len(),
                    skipped
                );
                Ok(ImportReport {
                    project,
                    files,
                    skipped,
                })
            }
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                    error!(
                        "Failed to remove partial project {}: {}",
                        dir.display(),
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }
}

/// Write every usable file entry at the top of `dir`; later duplicates win
fn extract_flat(
    dir: &Path,
    bytes: &[u8],
    limits: ExtractLimits,
) -> Result<(Vec<String>, usize), ServiceError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ServiceError::InvalidArchive(format!("not a zip archive: {}", e)))?;

    let mut written = BTreeSet::new();
    let mut skipped = 0;
    let mut total: u64 = 0;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ServiceError::InvalidArchive(format!("entry {}: {}", index, e)))?;
        if entry.is_dir() {
            continue;
        }

        let raw_name = entry.name().to_string();
        let Some(name) = entry_base_name(&raw_name).and_then(sanitize) else {
            debug!("Skipping archive entry '{}'", raw_name);
            skipped += 1;
            continue;
        };
        let target = match confined_join(dir, &name) {
            Ok(target) => target,
            Err(e) => {
                debug!("Skipping archive entry '{}': {}", raw_name, e);
                skipped += 1;
                continue;
            }
        };

        // declared sizes are untrusted; the reader is bounded instead
        let allowed = limits.entry.min(limits.total - total);
        let capacity = usize::try_from(entry.size())
            .unwrap_or(MAX_PREALLOCATION)
            .min(MAX_PREALLOCATION);
        let mut data = Vec::with_capacity(capacity);
        (&mut entry)
            .take(allowed + 1)
            .read_to_end(&mut data)
            .map_err(|e| {
                ServiceError::InvalidArchive(format!("entry '{}' is unreadable: {}", raw_name, e))
            })?;
        let size = data.len() as u64;
        if size > allowed {
            return Err(ServiceError::InvalidArchive(format!(
                "entry '{}' expands past the decompression limit",
                raw_name
            )));
        }
        total += size;
        std::fs::write(&target, &data)?;
        written.insert(name.into_string());
    }

    if written.is_empty() {
        return Err(ServiceError::InvalidArchive(
            "archive contains no usable files".to_string(),
        ));
    }
    Ok((written.into_iter().collect(), skipped))
}
