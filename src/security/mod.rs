//! Name sanitization and path confinement for the project store

pub mod name;
pub mod path;

pub use name::{sanitize, FileName, ProjectName, SafeName};
pub use path::{artifact_path, confined_join, ensure_direct_child, PathResolver, PathSecurityError};
