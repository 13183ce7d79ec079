//! Import a zip archive as a new project

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use opentex::ProjectService;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to a .zip archive; its base name becomes the project name
    pub archive: PathBuf,
}

pub async fn execute_import(service: &ProjectService, args: ImportArgs) -> CliResult<()> {
    let file_name = args
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            CliError::Validation(format!("'{}' is not a file", args.archive.display()))
        })?;
    let bytes = tokio::fs::read(&args.archive).await?;

    let report = service.import_archive(&file_name, bytes).await?;
    println!(
        "Imported '{}' as project '{}' ({} files)",
        file_name,
        report.project,
        report.files.len()
    );
    for file in &report.files {
        println!("  {}", file);
    }
    if report.skipped > 0 {
        println!("  ({} unsafe or unnamed entries skipped)", report.skipped);
    }
    Ok(())
}
