//! Create a project

use crate::cli::error::CliResult;
use clap::Args;
use opentex::storage::DEFAULT_DOCUMENT;
use opentex::ProjectService;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Project name; sanitized, the raw text becomes the document title
    pub name: String,
}

pub async fn execute_new(service: &ProjectService, args: NewArgs) -> CliResult<()> {
    let project = service.store().create_project(&args.name).await?;
    println!("Created project '{}' with {}", project, DEFAULT_DOCUMENT);
    Ok(())
}
