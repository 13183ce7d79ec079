//! Serve command implementation

use crate::cli::config::Settings;
use crate::cli::error::{CliError, CliResult};
use clap::Args;
use opentex::http::server::OpenTexServer;
use opentex::ProjectService;
use std::sync::Arc;
use tracing::info;

/// Serve the OpenTex API over HTTP
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host to bind the server to
    #[arg(long, help = "Host to bind the server to (default from config)")]
    pub host: Option<String>,

    /// Port to bind the server to
    #[arg(long, help = "Port to bind the server to (default from config)")]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Bind address: flags win over configuration
    pub fn address(&self, settings: &Settings) -> (String, u16) {
        (
            self.host
                .clone()
                .unwrap_or_else(|| settings.server.host.clone()),
            self.port.unwrap_or(settings.server.port),
        )
    }
}

pub async fn execute_serve(
    service: Arc<ProjectService>,
    settings: &Settings,
    args: ServeArgs,
) -> CliResult<()> {
    let (host, port) = args.address(settings);
    info!("Starting OpenTex HTTP server on {}:{}", host, port);

    println!("OpenTex HTTP server starting...");
    println!("  Listening on: http://{}:{}", host, port);

    let server = OpenTexServer::from_ref(&service, &host, port).map_err(CliError::Config)?;

    // Blocks until shutdown
    server
        .serve()
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let settings = Settings::default();
        let args = ServeArgs {
            host: None,
            port: Some(9999),
        };
        assert_eq!(args.address(&settings), ("127.0.0.1".to_string(), 9999));

        let args = ServeArgs {
            host: Some("0.0.0.0".to_string()),
            port: None,
        };
        assert_eq!(args.address(&settings), ("0.0.0.0".to_string(), 5000));
    }
}
