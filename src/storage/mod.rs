//! Storage backends: project directories, uploaded archives and git credentials

pub mod archive;
pub mod credentials;
pub mod projects;

// Re-export main types
pub use archive::{ArchiveImporter, ImportReport};
pub use credentials::{CredentialStore, GitCredential};
pub use projects::{ProjectStore, DEFAULT_DOCUMENT};
