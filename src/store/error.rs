// ABOUTME: Error types for persistence backends.
// ABOUTME: Wraps filesystem and JSON failures with the path involved.

use std::path::PathBuf;

use crate::types::AccessKey;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },

    /// Key would escape the data directory if used as a file name.
    #[error("access key {0} is not a valid storage key")]
    InvalidKey(AccessKey),
}
