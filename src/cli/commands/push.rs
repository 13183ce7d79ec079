//! Publish a project with git

use crate::cli::error::CliResult;
use clap::Args;
use opentex::ProjectService;

#[derive(Debug, Args)]
pub struct PushArgs {
    /// Project name
    pub project: String,

    /// Output the step results as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute_push(service: &ProjectService, args: PushArgs) -> CliResult<()> {
    let result = service.publish(&args.project).await?;

    if args.json {
        let json_output = serde_json::to_string_pretty(&result).map_err(|e| {
            crate::cli::error::CliError::Config(format!("Failed to serialize JSON: {}", e))
        })?;
        println!("{}", json_output);
    } else {
        println!("Remote: {}", result.remote_url);
        for step in &result.steps {
            let marker = if step.succeeded() { "ok" } else { "FAILED" };
            println!("  [{}] {} (exit {})", marker, step.command, step.exit_code);
            if !step.succeeded() && !step.stderr.trim().is_empty() {
                for line in step.stderr.trim().lines() {
                    println!("        {}", line);
                }
            }
        }
    }

    result.into_result()?;
    println!("Pushed project '{}'", args.project.trim());
    Ok(())
}
