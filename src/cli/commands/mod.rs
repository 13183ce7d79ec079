//! Command modules for CLI

pub mod compile;
pub mod git_config;
pub mod import;
pub mod list;
pub mod new;
pub mod push;
pub mod serve;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
#[command(about = "OpenTex CLI commands")]
pub enum Commands {
    /// Run the HTTP API
    #[command(about = "Serve the project API over HTTP")]
    Serve(serve::ServeArgs),

    /// List projects, or the files of one project
    #[command(about = "List projects or the files of a project")]
    List(list::ListArgs),

    /// Create a project with the starter document
    #[command(about = "Create a new project")]
    New(new::NewArgs),

    /// Create a project from a zip archive
    #[command(about = "Import a zip archive as a new project")]
    Import(import::ImportArgs),

    /// Build a PDF from a project source file
    #[command(about = "Compile a project file to PDF")]
    Compile(compile::CompileArgs),

    /// Store or show the git identity and SSH key
    #[command(name = "git-config", about = "Configure git publishing credentials")]
    GitConfig(git_config::GitConfigArgs),

    /// Commit and push a project
    #[command(about = "Publish a project to its git remote")]
    Push(push::PushArgs),
}
