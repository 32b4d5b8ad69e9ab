// ABOUTME: Application-wide error types for otaflow.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::validator::CommandError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {}; run `otaflow init` first", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("no account configured; set `account` in otaflow.yml or OTAFLOW_ACCOUNT")]
    MissingAccount,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Command(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, Error>;
