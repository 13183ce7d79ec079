//! HTTP request handlers

pub mod compile;
pub mod files;
pub mod git;
pub mod projects;
pub mod status;

// Re-export AppState (used by all handlers)
pub use status::AppState;
