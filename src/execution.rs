//! External tool invocation with bounded wall-clock time and captured output

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Tool '{program}' could not be launched: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool '{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("IO error while running tool: {0}")]
    Io(#[from] std::io::Error),
}

/// One invocation of an external program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: PathBuf,
    pub environment_variables: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: working_directory.into(),
            environment_variables: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `program arg1 arg2 ...`, for logs and step reports
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip)]
    pub duration: Duration,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Seam between the build/publish orchestration and real processes
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ExecutionError>;
}

/// Runs tools as child processes of this server
#[derive(Debug, Default, Clone)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ExecutionError> {
        let mut cmd = TokioCommand::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &invocation.environment_variables {
            cmd.env(key, value);
        }

        let started = Instant::now();
        let child = cmd.spawn().map_err(|e| ExecutionError::Launch {
            program: invocation.program.clone(),
            source: e,
        })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop)
        let output = timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecutionError::Timeout {
                program: invocation.program.clone(),
                timeout: invocation.timeout,
            })??;

        let result = ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: started.elapsed(),
        };

        debug!(
            "{} in {} exited with {} after {:?}",
            invocation.command_line(),
            invocation.working_directory.display(),
            result.exit_code,
            result.duration
        );

        Ok(result)
    }
}
