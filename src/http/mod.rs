//! HTTP server implementation for OpenTex
//!
//! This module provides a REST API server using Axum over the project
//! service: project and file CRUD, archive upload, compilation and git publishing.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod server;

pub use models::{ApiResponse, ErrorResponse};
/// Re-export commonly used types
pub use server::OpenTexServer;
