// ABOUTME: Configuration types and parsing for otaflow.yml.
// ABOUTME: Handles YAML parsing, file discovery, and the account env override.

mod deserialize;
mod init;

pub use init::init_config;

use deserialize::{deserialize_account, deserialize_deployments};

use crate::error::{Error, Result};
use crate::service::ServiceSettings;
use crate::types::{DeploymentName, Email};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "otaflow.yml";
pub const CONFIG_FILENAME_ALT: &str = "otaflow.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".otaflow/config.yml";

/// Environment variable that overrides the configured account.
pub const ACCOUNT_ENV: &str = "OTAFLOW_ACCOUNT";

pub const DEFAULT_DATA_DIR: &str = ".otaflow/data";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DEPLOYMENTS: [&str; 2] = ["Staging", "Production"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Acting collaborator; owner of apps it creates.
    #[serde(default, deserialize_with = "deserialize_account")]
    pub account: Option<Email>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_lock_timeout", with = "humantime_serde")]
    pub lock_timeout: Duration,

    #[serde(
        default = "default_deployments",
        deserialize_with = "deserialize_deployments"
    )]
    pub default_deployments: NonEmpty<DeploymentName>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_lock_timeout() -> Duration {
    DEFAULT_LOCK_TIMEOUT
}

fn default_deployments() -> NonEmpty<DeploymentName> {
    NonEmpty {
        head: DeploymentName::builtin(DEFAULT_DEPLOYMENTS[0]),
        tail: DEFAULT_DEPLOYMENTS[1..]
            .iter()
            .copied()
            .map(DeploymentName::builtin)
            .collect(),
    }
}

/// The built-in default deployments.
pub fn default_deployment_names() -> Vec<DeploymentName> {
    default_deployments().into_iter().collect()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find and load the config in `dir`. A relative `data_dir` is
    /// resolved against `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                let mut config = Self::load(path)?;
                if config.data_dir.is_relative() {
                    config.data_dir = dir.join(&config.data_dir);
                }
                return Ok(config);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The acting account, preferring `OTAFLOW_ACCOUNT` over the file.
    pub fn account(&self) -> Result<Email> {
        match std::env::var(ACCOUNT_ENV) {
            Ok(value) if !value.trim().is_empty() => Email::new(&value)
                .map_err(|e| Error::InvalidConfig(format!("{ACCOUNT_ENV}: {e}"))),
            _ => self.account.clone().ok_or(Error::MissingAccount),
        }
    }

    pub fn service_settings(&self) -> Result<ServiceSettings> {
        Ok(ServiceSettings {
            account: self.account()?,
            default_deployments: self.default_deployments.iter().cloned().collect(),
            lock_timeout: self.lock_timeout,
        })
    }
}
