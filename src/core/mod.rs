//! Core service layer modules

pub mod build;
pub mod publish;
pub mod service;

// Re-export main types for convenience
pub use build::{BuildConfig, BuildOutput, BuildRunner};
pub use publish::{PublishConfig, PublishResult, PublishRunner, StepResult};
pub use service::{GitStatus, ProjectService, ServiceConfig, ServiceError};
