// ABOUTME: Cross-process lock files under the data directory.
// ABOUTME: Created atomically with holder info; stale or unreadable locks are broken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::StoreError;

/// Locks held longer than this are assumed abandoned by a crashed process.
const STALE_AFTER_MINUTES: i64 = 10;

/// Information about who holds a lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    /// What the lock protects.
    pub resource: String,
}

impl LockInfo {
    /// Lock info for the current process.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            resource: resource.into(),
        }
    }

    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_minutes() >= STALE_AFTER_MINUTES
    }
}

/// Create the lock file at `path`. Returns `false` if it already exists.
pub(super) async fn try_create(path: &Path, resource: &str) -> Result<bool, StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let info = serde_json::to_string(&LockInfo::new(resource)).map_err(|source| {
        StoreError::Serialize {
            what: "lock info",
            source,
        }
    })?;

    // Linking a complete temp file into place is atomic and never shows an empty lock.
    let tmp = path.with_extension(format!("lock.{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, info).await.map_err(io_err)?;
    let linked = tokio::fs::hard_link(&tmp, path).await;
    let _ = tokio::fs::remove_file(&tmp).await;

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(io_err(source)),
    }
}

/// Remove the lock at `path` if its holder looks gone.
///
/// Returns `true` when the lock is no longer there and creation is worth
/// retrying.
pub(super) async fn break_if_stale(path: &Path) -> Result<bool, StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(source) => return Err(io_err(source)),
    };

    match serde_json::from_str::<LockInfo>(&content) {
        Ok(info) if !info.is_stale() => return Ok(false),
        Ok(info) => tracing::warn!(
            "Breaking stale lock on {} held by {} (pid {}) since {}",
            info.resource,
            info.holder,
            info.pid,
            info.started_at
        ),
        Err(_) => tracing::warn!("Breaking unreadable lock {}", path.display()),
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(source) => Err(io_err(source)),
    }
}

/// Remove a held lock file. Runs from `Drop`, so failures are only logged.
pub(super) fn release(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Released lock {}", path.display()),
        Err(e) => tracing::warn!("Failed to remove lock {}: {}", path.display(), e),
    }
}
