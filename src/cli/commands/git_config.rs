//! Store or show the git publishing credential

use crate::cli::error::{CliError, CliResult};
use clap::Args;
use opentex::ProjectService;
use std::path::PathBuf;

/// Without options, prints the stored identity
#[derive(Debug, Args)]
pub struct GitConfigArgs {
    /// Git host, e.g. github.com
    #[arg(long)]
    pub host: Option<String>,

    /// Account name on the host
    #[arg(long)]
    pub username: Option<String>,

    /// Private key file to copy into the credential store
    #[arg(long)]
    pub private_key: Option<PathBuf>,

    /// Optional public key file
    #[arg(long)]
    pub public_key: Option<PathBuf>,
}

pub async fn execute_git_config(service: &ProjectService, args: GitConfigArgs) -> CliResult<()> {
    let (host, username, private_key) = match (args.host, args.username, args.private_key) {
        (None, None, None) => {
            let status = service.git_status().await?;
            match (status.host, status.username) {
                (Some(host), Some(username)) => {
                    println!("Git publishing as {}@{}", username, host);
                    println!(
                        "  public key: {}",
                        if status.has_public_key { "yes" } else { "no" }
                    );
                }
                _ => println!("Git publishing is not configured"),
            }
            return Ok(());
        }
        (Some(host), Some(username), Some(private_key)) => (host, username, private_key),
        _ => {
            return Err(CliError::Validation(
                "--host, --username and --private-key must be given together".to_string(),
            ))
        }
    };

    let private_key = tokio::fs::read(&private_key).await?;
    let public_key = match &args.public_key {
        Some(path) => Some(tokio::fs::read(path).await?),
        None => None,
    };

    let credential = service
        .configure_git(&host, &username, &private_key, public_key.as_deref())
        .await?;
    println!(
        "Stored git credential for {}@{} in {}",
        credential.username,
        credential.host,
        service.credentials().dir().display()
    );
    Ok(())
}
