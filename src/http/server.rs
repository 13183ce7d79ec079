//! Axum HTTP server implementation

use crate::core::service::ProjectService;
use crate::http::handlers::{compile, files, git, projects, status, AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest request body accepted (archive uploads, raw file saves)
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Build the API router over `state`
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Status endpoint
        .route("/api/status", get(status::status))
        // Projects
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/upload_zip", post(projects::upload_zip))
        .route(
            "/api/projects/:project",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route(
            "/api/projects/:project/delete",
            post(projects::delete_project),
        )
        // Files
        .route(
            "/api/projects/:project/files",
            get(files::list_files)
                .post(files::create_file)
                .delete(files::delete_file),
        )
        .route("/api/projects/:project/git_push", post(git::git_push))
        .route(
            "/api/projects/:project/:file",
            get(files::read_file).post(files::save_file),
        )
        // Build
        .route("/api/compile", post(compile::compile))
        .route("/api/download_pdf", get(compile::download_pdf))
        // Git
        .route(
            "/api/git/config",
            get(git::get_git_config).post(git::set_git_config),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_methods([Method::GET, Method::POST, Method::DELETE])
                    .allow_headers(Any)
                    .allow_origin(Any),
            ),
        )
        .with_state(state)
}

/// OpenTex HTTP server
pub struct OpenTexServer {
    service: Arc<ProjectService>,
    addr: SocketAddr,
}

impl OpenTexServer {
    /// Create a new server instance from an Arc-wrapped service reference
    pub fn from_ref(service: &Arc<ProjectService>, host: &str, port: u16) -> Result<Self, String> {
        let addr = Self::parse_address(host, port)?;
        Ok(Self {
            service: Arc::clone(service),
            addr,
        })
    }

    /// Parse and normalize host:port into a SocketAddr
    fn parse_address(host: &str, port: u16) -> Result<SocketAddr, String> {
        // Normalize common hostnames for SocketAddr compatibility
        let normalized_host = Self::normalize_host(host);

        // IPv6 addresses need brackets
        let addr_str = if normalized_host.contains(':') {
            format!("[{}]:{}", normalized_host, port)
        } else {
            format!("{}:{}", normalized_host, port)
        };

        addr_str.parse().map_err(|_| {
            format!(
                "Unable to parse address '{}'. Use IP addresses like '127.0.0.1', '0.0.0.0', '::1', or 'localhost'",
                addr_str
            )
        })
    }

    /// Normalize hostnames for SocketAddr compatibility
    fn normalize_host(host: &str) -> String {
        match host {
            "localhost" => "127.0.0.1".to_string(),
            "::1" | "[::1]" => "::1".to_string(),
            "::" | "[::]" => "::".to_string(),
            _ => host.to_string(),
        }
    }

    /// Router with all routes and shared state
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.service.clone()))
    }

    /// Start the server
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        info!("Starting OpenTex HTTP server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let actual_addr = listener.local_addr()?;
        info!("Server bound to {}", actual_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            OpenTexServer::parse_address("localhost", 5000).unwrap(),
            "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            OpenTexServer::parse_address("[::1]", 8080).unwrap(),
            "[::1]:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(OpenTexServer::parse_address("not a host", 80).is_err());
    }
}
