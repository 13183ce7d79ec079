//! Main CLI application structure

use clap::Parser;
use opentex::ProjectService;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::{
    compile, git_config, import, list, new, push, serve, Commands,
};
use crate::cli::config::Settings;
use crate::cli::error::{CliError, CliResult};

/// OpenTex CLI - LaTeX projects, PDF builds and git publishing
#[derive(Debug, Parser)]
#[command(name = "opentex")]
#[command(version = opentex::VERSION)]
#[command(about = "OpenTex CLI - LaTeX projects, PDF builds and git publishing")]
#[command(long_about = "OpenTex manages LaTeX projects stored as directories under a projects root.\n\n\
                         Configuration is read from (later wins):\n\
                         1. built-in defaults\n\
                         2. --config <file>, else ./opentex.toml, else <config dir>/opentex/opentex.toml\n\
                         3. OPENTEX__<SECTION>__<KEY> environment variables\n\n\
                         Examples:\n\
                           opentex serve --port 5000            # Run the HTTP API\n\
                           opentex new \"My Paper\"               # Create a project\n\
                           opentex compile My_Paper document.tex\n\
                           opentex push My_Paper")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (overrides discovery)
    #[arg(long, global = true, help = "Path to an opentex.toml configuration file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> CliResult<()> {
        if self.verbose {
            opentex::init_logging_with_default("opentex=debug,tower_http=debug");
        } else {
            opentex::init_logging();
        }

        let settings = Settings::load(self.config.as_deref())?;
        let config = settings.service_config()?;

        if self.verbose {
            eprintln!("Using projects directory: {}", config.projects_dir.display());
        }

        let service = ProjectService::new(config).map_err(CliError::Service)?;

        match self.command {
            Commands::Serve(args) => serve::execute_serve(Arc::new(service), &settings, args).await,
            Commands::List(args) => list::execute_list(&service, args).await,
            Commands::New(args) => new::execute_new(&service, args).await,
            Commands::Import(args) => import::execute_import(&service, args).await,
            Commands::Compile(args) => compile::execute_compile(&service, args).await,
            Commands::GitConfig(args) => git_config::execute_git_config(&service, args).await,
            Commands::Push(args) => push::execute_push(&service, args).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_with_global_flags() {
        let cli = Cli::try_parse_from([
            "opentex",
            "compile",
            "paper",
            "main.tex",
            "--config",
            "/etc/opentex.toml",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/opentex.toml")));
        match cli.command {
            Commands::Compile(args) => {
                assert_eq!(args.project, "paper");
                assert_eq!(args.file, "main.tex");
            }
            other => unreachable!("parsed as {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["opentex"]).is_err());
    }
}
