// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates otaflow.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Email;

use super::{CONFIG_FILENAME, DEFAULT_DATA_DIR, DEFAULT_DEPLOYMENTS};

const PLACEHOLDER_ACCOUNT: &str = "you@example.com";

/// Write a starter `otaflow.yml` into `dir` and return its path.
pub fn init_config(dir: &Path, account: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let account = match account {
        Some(value) => Email::new(value)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?
            .to_string(),
        None => PLACEHOLDER_ACCOUNT.to_string(),
    };

    std::fs::write(&config_path, generate_template_yaml(&account))?;
    tracing::debug!("Wrote {}", config_path.display());

    Ok(config_path)
}

fn generate_template_yaml(account: &str) -> String {
    let deployments = DEFAULT_DEPLOYMENTS
        .iter()
        .map(|name| format!("  - {name}\n"))
        .collect::<String>();
    format!(
        r#"# Account that owns the apps you create (overridden by OTAFLOW_ACCOUNT)
account: {account}

# Where apps and release histories are stored
data_dir: {DEFAULT_DATA_DIR}

# How long to wait for another command working on the same deployment
lock_timeout: 30s

# Deployments created with every new app
default_deployments:
{deployments}"#
    )
}
