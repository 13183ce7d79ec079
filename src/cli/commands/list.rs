//! List projects or project files

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use opentex::ProjectService;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Project whose files to list; lists all projects when omitted
    pub project: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Execute the list command
pub async fn execute_list(service: &ProjectService, args: ListArgs) -> CliResult<()> {
    let (project, names) = match &args.project {
        Some(raw) => {
            let (project, files) = service.store().list_files(raw).await?;
            (Some(project), files)
        }
        None => (None, service.store().list_projects().await?),
    };

    if args.json {
        let json_output = serde_json::to_string_pretty(&names)
            .map_err(|e| CliError::Config(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_output);
        return Ok(());
    }

    if names.is_empty() {
        match project {
            Some(project) => println!("Project '{}' has no files", project),
            None => println!("No projects found"),
        }
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
