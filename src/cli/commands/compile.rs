//! Compile a project file to PDF

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use opentex::storage::DEFAULT_DOCUMENT;
use opentex::{ProjectService, ServiceError};

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Project name
    pub project: String,

    /// Source file inside the project
    #[arg(default_value = DEFAULT_DOCUMENT)]
    pub file: String,
}

pub async fn execute_compile(service: &ProjectService, args: CompileArgs) -> CliResult<()> {
    match service.compile(&args.project, &args.file).await {
        Ok(output) => {
            println!("PDF written to {}", output.artifact_path.display());
            Ok(())
        }
        Err(ServiceError::BuildFailed { file, diagnostics }) => {
            eprintln!("{}", diagnostics);
            Err(CliError::Service(ServiceError::BuildFailed {
                file,
                diagnostics: String::new(),
            }))
        }
        Err(e) => Err(e.into()),
    }
}
