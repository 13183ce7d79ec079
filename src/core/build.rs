//! PDF builds: runs the typesetter against a project directory

use crate::core::service::ServiceError;
use crate::execution::{ExecutionError, ToolInvocation, ToolOutput, ToolRunner};
use crate::security::{artifact_path, confined_join, FileName};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Largest slice of a typesetter log returned as build diagnostics
const LOG_TAIL_BYTES: usize = 8 * 1024;

/// Filesystems with coarse timestamps can report an mtime slightly before the
/// invocation that wrote the file.
const MTIME_TOLERANCE: Duration = Duration::from_secs(2);

/// Typesetter configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Typesetter binary, resolved through PATH
    pub program: String,

    /// Wall-clock limit per pass
    pub timeout: Duration,

    /// Reject a PDF whose mtime predates the build (left over from an earlier run)
    pub require_fresh_artifact: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: "pdflatex".to_string(),
            timeout: Duration::from_secs(30),
            require_fresh_artifact: false,
        }
    }
}

/// Successful build
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub artifact_path: PathBuf,
    pub passes: u32,
}

enum PassOutcome {
    Finished(ToolOutput),
    TimedOut,
}

pub struct BuildRunner {
    config: BuildConfig,
    runner: Arc<dyn ToolRunner>,
}

impl BuildRunner {
    pub fn new(config: BuildConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    fn invocation(&self, project_dir: &Path, source: &FileName) -> ToolInvocation {
        ToolInvocation::new(&self.config.program, project_dir)
            .args([
                "-interaction=nonstopmode",
                "-output-directory=.",
                source.as_str(),
            ])
            .timeout(self.config.timeout)
    }

    async fn run_pass(
        &self,
        invocation: &ToolInvocation,
        pass: u32,
    ) -> Result<PassOutcome, ServiceError> {
        match self.runner.run(invocation).await {
            Ok(output) => {
                if !output.success() {
                    debug!(
                        "Typesetter pass {} exited with {} (artifact decides success)",
                        pass, output.exit_code
                    );
                }
                Ok(PassOutcome::Finished(output))
            }
            Err(ExecutionError::Timeout { timeout, .. }) => {
                warn!("Typesetter pass {} timed out after {:?}", pass, timeout);
                Ok(PassOutcome::TimedOut)
            }
            Err(ExecutionError::Launch { program, source }) => Err(ServiceError::ToolUnavailable(
                format!("{}: {}", program, source),
            )),
            Err(ExecutionError::Io(e)) => Err(ServiceError::Io(e)),
        }
    }

    async fn artifact_ready(&self, artifact: &Path, started: SystemTime) -> bool {
        let Ok(metadata) = tokio::fs::metadata(artifact).await else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }
        if !self.config.require_fresh_artifact {
            return true;
        }
        let threshold = started.checked_sub(MTIME_TOLERANCE).unwrap_or(started);
        match metadata.modified() {
            Ok(modified) => modified >= threshold,
            // No mtime support: nothing to compare against
            Err(_) => true,
        }
    }

    async fn diagnostics(&self, source_path: &Path, outcome: &PassOutcome) -> String {
        let log_path = source_path.with_extension("log");
        if let Ok(bytes) = tokio::fs::read(&log_path).await {
            let log = String::from_utf8_lossy(&bytes);
            if !log.trim().is_empty() {
                return tail(&log, LOG_TAIL_BYTES).to_string();
            }
        }
        match outcome {
            PassOutcome::Finished(output) => {
                let mut text = output.stdout.clone();
                if !output.stderr.is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&output.stderr);
                }
                tail(&text, LOG_TAIL_BYTES).to_string()
            }
            PassOutcome::TimedOut => format!(
                "{} timed out after {:?}",
                self.config.program, self.config.timeout
            ),
        }
    }

    /// Compile `source` inside `project_dir` into `<stem>.pdf`.
    ///
    /// The typesetter's exit code is ignored: the build succeeded when the PDF
    /// exists afterwards. A successful first pass is followed by a second pass to
    /// settle cross-references; its outcome is not inspected.
    pub async fn compile(
        &self,
        project_dir: &Path,
        source: &FileName,
    ) -> Result<BuildOutput, ServiceError> {
        let source_path = confined_join(project_dir, source)?;
        let is_file = tokio::fs::metadata(&source_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ServiceError::NotFound(format!("source file '{}'", source)));
        }

        let artifact = artifact_path(&source_path);
        let invocation = self.invocation(project_dir, source);
        let started = SystemTime::now();

        info!("Compiling {} in {}", source, project_dir.display());
        let first = self.run_pass(&invocation, 1).await?;

        if !self.artifact_ready(&artifact, started).await {
            let diagnostics = self.diagnostics(&source_path, &first).await;
            warn!("Build of {} produced no PDF", source);
            return Err(ServiceError::BuildFailed {
                file: source.to_string(),
                diagnostics,
            });
        }

        if let Err(e) = self.run_pass(&invocation, 2).await {
            warn!("Second typesetter pass for {} failed: {}", source, e);
        }

        info!("Built {}", artifact.display());
        Ok(BuildOutput {
            artifact_path: artifact,
            passes: 2,
        })
    }
}

/// Last `max` bytes of `text`, moved forward to a char boundary
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
