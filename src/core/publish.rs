//! Git publishing of a project directory using the system git binary

use crate::core::service::ServiceError;
use crate::execution::{ExecutionError, ToolInvocation, ToolRunner};
use crate::security::ProjectName;
use crate::storage::credentials::GitCredential;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Exit code recorded when git could not be started at all
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 99;

/// Exit code recorded when a git command ran past its timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Git publishing configuration
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Git binary, resolved through PATH
    pub program: String,

    /// Branch created by `init` and pushed to the remote
    pub default_branch: String,

    /// Message used for every publish commit
    pub commit_message: String,

    /// Scheme of the remote URL (`ssh` gives `ssh://user@host/user/repo`)
    pub remote_protocol: String,

    /// Appended to the project name to form the remote repository name
    pub repository_suffix: String,

    /// Wall-clock limit per git command
    pub timeout: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            default_branch: "main".to_string(),
            commit_message: "Auto commit from OpenTex Editor".to_string(),
            remote_protocol: "ssh".to_string(),
            repository_suffix: "-tex".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Outcome of one git command
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Outcome of a whole publish sequence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    /// True iff the final push exited 0
    pub ok: bool,

    /// True when repository initialization failed and nothing else ran
    pub aborted: bool,

    pub remote_url: String,

    pub steps: Vec<StepResult>,
}

impl PublishResult {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.succeeded())
    }

    /// Turn a result whose push did not succeed into `PublishPartial`
    pub fn into_result(self) -> Result<Self, ServiceError> {
        if self.ok {
            return Ok(self);
        }
        let failed: Vec<String> = self
            .failed_steps()
            .map(|s| format!("'{}' exited {}", s.command, s.exit_code))
            .collect();
        Err(ServiceError::PublishPartial(if failed.is_empty() {
            "push did not complete".to_string()
        } else {
            failed.join(", ")
        }))
    }
}

/// `<protocol>://<user>@<host>/<user>/<project><suffix>`
pub fn remote_url(config: &PublishConfig, credential: &GitCredential, project: &str) -> String {
    format!(
        "{}://{}@{}/{}/{}{}",
        config.remote_protocol,
        credential.username,
        credential.host,
        credential.username,
        project,
        config.repository_suffix
    )
}

/// SSH transport pinned to the stored key, without host-key prompts
pub fn ssh_command(private_key_path: &Path) -> String {
    let key = private_key_path.to_string_lossy().replace('\'', r"'\''");
    format!(
        "ssh -i '{}' -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null",
        key
    )
}

pub struct PublishRunner {
    config: PublishConfig,
    runner: Arc<dyn ToolRunner>,
}

impl PublishRunner {
    pub fn new(config: PublishConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    /// Run one git command; launch failures and timeouts become synthetic results
    async fn step(&self, project_dir: &Path, ssh: &str, args: &[&str]) -> StepResult {
        let invocation = ToolInvocation::new(&self.config.program, project_dir)
            .args(args.iter().copied())
            .env("GIT_SSH_COMMAND", ssh)
            .env("GIT_TERMINAL_PROMPT", "0")
            .timeout(self.config.timeout);
        let command = invocation.command_line();

        let result = match self.runner.run(&invocation).await {
            Ok(output) => StepResult {
                command,
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(e @ ExecutionError::Timeout { .. }) => StepResult {
                command,
                exit_code: TIMEOUT_EXIT_CODE,
                stdout: String::new(),
                stderr: e.to_string(),
            },
            Err(e) => StepResult {
                command,
                exit_code: LAUNCH_FAILURE_EXIT_CODE,
                stdout: String::new(),
                stderr: e.to_string(),
            },
        };

        if result.succeeded() {
            info!("{} -> ok", result.command);
        } else {
            warn!(
                "{} -> exit {}: {}",
                result.command,
                result.exit_code,
                result.stderr.trim()
            );
        }
        result
    }

    /// Commit the project directory and push it to its remote.
    ///
    /// Only a failed `init` stops the sequence; every later step runs whatever
    /// the previous exit code was, and `ok` reflects the push alone.
    pub async fn publish(
        &self,
        project_dir: &Path,
        credential: &GitCredential,
        project: &ProjectName,
    ) -> PublishResult {
        let ssh = ssh_command(&credential.private_key_path);
        let branch = self.config.default_branch.as_str();
        let url = remote_url(&self.config, credential, project.as_str());
        let mut steps = Vec::new();

        info!("Publishing {} to {}", project, url);

        if project_dir.join(".git").exists() {
            steps.push(self.step(project_dir, &ssh, &["branch", "-M", branch]).await);
        } else {
            let init = self.step(project_dir, &ssh, &["init", "-b", branch]).await;
            let failed = !init.succeeded();
            steps.push(init);
            if failed {
                return PublishResult {
                    ok: false,
                    aborted: true,
                    remote_url: url,
                    steps,
                };
            }
        }

        let email = format!("{}@{}", credential.username, credential.host);
        steps.push(
            self.step(project_dir, &ssh, &["config", "user.name", &credential.username])
                .await,
        );
        steps.push(
            self.step(project_dir, &ssh, &["config", "user.email", &email])
                .await,
        );
        steps.push(self.step(project_dir, &ssh, &["add", "."]).await);
        steps.push(
            self.step(
                project_dir,
                &ssh,
                &["commit", "-m", &self.config.commit_message],
            )
            .await,
        );

        // absent on first publish
        let _ = self
            .step(project_dir, &ssh, &["remote", "remove", "origin"])
            .await;
        steps.push(
            self.step(project_dir, &ssh, &["remote", "add", "origin", &url])
                .await,
        );

        let push = self
            .step(project_dir, &ssh, &["push", "-u", "origin", branch])
            .await;
        let ok = push.succeeded();
        steps.push(push);

        PublishResult {
            ok,
            aborted: false,
            remote_url: url,
            steps,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::execution::ToolOutput;
    use crate::security::sanitize;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fake git: exit codes keyed by subcommand, every call recorded
    #[derive(Default)]
    struct ScriptedGit {
        exit_codes: HashMap<&'static str, i32>,
        missing_binary: bool,
        calls: Mutex<Vec<ToolInvocation>>,
    }

    impl ScriptedGit {
        fn failing(subcommands: &[(&'static str, i32)]) -> Self {
            Self {
                exit_codes: subcommands.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn commands(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.args.join(" "))
                .collect()
        }
    }

    #[async_trait]
    impl ToolRunner for ScriptedGit {
        async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ExecutionError> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.missing_binary {
                return Err(ExecutionError::Launch {
                    program: invocation.program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
                });
            }
            let subcommand = invocation.args.first().map(String::as_str).unwrap_or("");
            let exit_code = self.exit_codes.get(subcommand).copied().unwrap_or(0);
            Ok(ToolOutput {
                exit_code,
                stdout: format!("{} done", subcommand),
                stderr: if exit_code == 0 {
                    String::new()
                } else {
                    format!("{} failed", subcommand)
                },
                duration: Duration::ZERO,
            })
        }
    }

    fn credential() -> GitCredential {
        GitCredential {
            host: "git.example.org".to_string(),
            username: "alice".to_string(),
            private_key_path: PathBuf::from("/var/opentex/git_config/id_rsa"),
            public_key_path: None,
            updated_at: None,
        }
    }

    fn project_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("paper");
        std::fs::create_dir_all(&dir).unwrap();
        (temp_dir, dir)
    }

    #[tokio::test]
    async fn test_fresh_project_runs_full_sequence() {
        let (_temp, dir) = project_dir();
        let git = Arc::new(ScriptedGit::default());
        let runner = PublishRunner::new(PublishConfig::default(), git.clone());

        let result = runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        assert!(result.ok);
        assert!(!result.aborted);
        assert_eq!(result.remote_url, "ssh://alice@git.example.org/alice/paper-tex");
        assert_eq!(
            git.commands(),
            vec![
                "init -b main",
                "config user.name alice",
                "config user.email alice@git.example.org",
                "add .",
                "commit -m Auto commit from OpenTex Editor",
                "remote remove origin",
                "remote add origin ssh://alice@git.example.org/alice/paper-tex",
                "push -u origin main",
            ]
        );
        // `remote remove` is not reported
        assert_eq!(result.steps.len(), 7);
        assert_eq!(result.steps[0].command, "git init -b main");
        assert_eq!(result.steps[6].command, "git push -u origin main");
    }

    #[tokio::test]
    async fn test_existing_repository_forces_branch_name() {
        let (_temp, dir) = project_dir();
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        let git = Arc::new(ScriptedGit::default());
        let runner = PublishRunner::new(PublishConfig::default(), git.clone());

        let result = runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        assert!(result.ok);
        let commands = git.commands();
        assert_eq!(commands[0], "branch -M main");
        assert!(!commands.iter().any(|c| c.starts_with("init")));
    }

    #[tokio::test]
    async fn test_init_failure_aborts() {
        let (_temp, dir) = project_dir();
        let git = Arc::new(ScriptedGit::failing(&[("init", 128)]));
        let runner = PublishRunner::new(PublishConfig::default(), git.clone());

        let result = runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        assert!(!result.ok);
        assert!(result.aborted);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].exit_code, 128);
        assert_eq!(git.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_does_not_block_push() {
        let (_temp, dir) = project_dir();
        let git = Arc::new(ScriptedGit::failing(&[("commit", 1)]));
        let runner = PublishRunner::new(PublishConfig::default(), git);

        let result = runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        assert!(result.ok);
        let failed: Vec<_> = result.failed_steps().map(|s| s.command.clone()).collect();
        assert_eq!(failed, vec!["git commit -m Auto commit from OpenTex Editor"]);
        assert!(result.into_result().is_ok());
    }

    #[tokio::test]
    async fn test_failed_push_is_partial() {
        let (_temp, dir) = project_dir();
        let git = Arc::new(ScriptedGit::failing(&[("push", 128)]));
        let runner = PublishRunner::new(PublishConfig::default(), git);

        let result = runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        assert!(!result.ok);
        assert!(!result.aborted);
        match result.into_result() {
            Err(ServiceError::PublishPartial(msg)) => assert!(msg.contains("push")),
            other => panic!("expected PublishPartial, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_recorded_not_raised() {
        let (_temp, dir) = project_dir();
        let git = Arc::new(ScriptedGit {
            missing_binary: true,
            ..Default::default()
        });
        let runner = PublishRunner::new(PublishConfig::default(), git);

        let result = runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        assert!(result.aborted);
        assert_eq!(result.steps[0].exit_code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(result.steps[0].stderr.contains("could not be launched"));
    }

    #[tokio::test]
    async fn test_every_command_uses_stored_key_and_timeout() {
        let (_temp, dir) = project_dir();
        let git = Arc::new(ScriptedGit::default());
        let runner = PublishRunner::new(PublishConfig::default(), git.clone());

        runner
            .publish(&dir, &credential(), &sanitize("paper").unwrap())
            .await;

        let calls = git.calls.lock().unwrap();
        assert_eq!(calls.len(), 8);
        for call in calls.iter() {
            assert_eq!(call.program, "git");
            assert_eq!(call.working_directory, dir);
            assert_eq!(call.timeout, Duration::from_secs(60));
            let ssh = call
                .environment_variables
                .iter()
                .find(|(k, _)| k == "GIT_SSH_COMMAND")
                .map(|(_, v)| v.as_str())
                .unwrap();
            assert_eq!(
                ssh,
                "ssh -i '/var/opentex/git_config/id_rsa' -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null"
            );
        }
    }

    #[test]
    fn test_remote_url_uses_configured_protocol_and_suffix() {
        let config = PublishConfig {
            remote_protocol: "git+ssh".to_string(),
            repository_suffix: "-latex".to_string(),
            ..Default::default()
        };
        assert_eq!(
            remote_url(&config, &credential(), "thesis"),
            "git+ssh://alice@git.example.org/alice/thesis-latex"
        );
    }

    #[test]
    fn test_ssh_command_quotes_key_path() {
        assert_eq!(
            ssh_command(Path::new("/keys/it's here/id_rsa")),
            r"ssh -i '/keys/it'\''s here/id_rsa' -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null"
        );
    }
}
