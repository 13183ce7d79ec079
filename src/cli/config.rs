//! Layered configuration for the CLI: defaults, TOML file, environment

use crate::cli::error::{CliError, CliResult};
use config::{Config, Environment, File, FileFormat};
use opentex::{BuildConfig, PublishConfig, ServiceConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File name searched in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "opentex.toml";

/// Prefix of environment overrides, e.g. `OPENTEX__SERVER__PORT=8000`
pub const ENV_PREFIX: &str = "OPENTEX";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub build: BuildSettings,
    pub publish: PublishSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub projects_dir: PathBuf,
    pub credentials_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let defaults = ServiceConfig::default();
        Self {
            projects_dir: defaults.projects_dir,
            credentials_dir: defaults.credentials_dir,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    pub program: String,
    pub timeout_secs: u64,
    pub require_fresh_artifact: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        let defaults = BuildConfig::default();
        Self {
            program: defaults.program,
            timeout_secs: defaults.timeout.as_secs(),
            require_fresh_artifact: defaults.require_fresh_artifact,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishSettings {
    pub program: String,
    pub default_branch: String,
    pub commit_message: String,
    pub remote_protocol: String,
    pub repository_suffix: String,
    pub timeout_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        let defaults = PublishConfig::default();
        Self {
            program: defaults.program,
            default_branch: defaults.default_branch,
            commit_message: defaults.commit_message,
            remote_protocol: defaults.remote_protocol,
            repository_suffix: defaults.repository_suffix,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            build: BuildSettings::default(),
            publish: PublishSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `explicit` (must exist) or the first config file found,
    /// then apply `OPENTEX__*` environment overrides
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::load_with(explicit, env)
    }

    fn load_with(explicit: Option<&Path>, env: Environment) -> CliResult<Self> {
        let mut builder = Config::builder();
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(path) = discover_config_file() {
                    debug!("Loading configuration from {}", path.display());
                    builder = builder.add_source(File::from(path).format(FileFormat::Toml));
                }
            }
        }

        builder
            .add_source(env)
            .build()
            .and_then(|config| config.try_deserialize::<Settings>())
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Service configuration described by these settings
    pub fn service_config(&self) -> CliResult<ServiceConfig> {
        if self.build.timeout_secs == 0 || self.publish.timeout_secs == 0 {
            return Err(CliError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.publish.default_branch.trim().is_empty() {
            return Err(CliError::Config("publish.default_branch is empty".to_string()));
        }

        Ok(ServiceConfig {
            projects_dir: self.storage.projects_dir.clone(),
            credentials_dir: self.storage.credentials_dir.clone(),
            build: BuildConfig {
                program: self.build.program.clone(),
                timeout: Duration::from_secs(self.build.timeout_secs),
                require_fresh_artifact: self.build.require_fresh_artifact,
            },
            publish: PublishConfig {
                program: self.publish.program.clone(),
                default_branch: self.publish.default_branch.clone(),
                commit_message: self.publish.commit_message.clone(),
                remote_protocol: self.publish.remote_protocol.clone(),
                repository_suffix: self.publish.repository_suffix.clone(),
                timeout: Duration::from_secs(self.publish.timeout_secs),
            },
        })
    }
}

/// `./opentex.toml`, else `<config dir>/opentex/opentex.toml`
fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("opentex").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}
