// ABOUTME: File-backed store: apps.json plus one JSON history per deployment key.
// ABOUTME: Writes go to a temporary sibling and are renamed into place; locks are files too.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::{Backend, LockTarget, StoreError, StoreLock, lock_file};
use crate::history::PackageHistory;
use crate::registry::Registry;
use crate::types::AccessKey;

const APPS_FILE: &str = "apps.json";
const HISTORY_DIR: &str = "history";
const LOCK_DIR: &str = "locks";

/// Stores the registry as `{root}/apps.json` and each history as
/// `{root}/history/{key}.json`. Locks are `{root}/locks/*.lock` files, so
/// every process pointed at the same root honours them.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn apps_path(&self) -> PathBuf {
        self.root.join(APPS_FILE)
    }

    fn history_path(&self, key: &AccessKey) -> Result<PathBuf, StoreError> {
        if !key.is_path_safe() {
            return Err(StoreError::InvalidKey(key.clone()));
        }
        Ok(self
            .root
            .join(HISTORY_DIR)
            .join(format!("{}.json", key.as_str())))
    }

    fn lock_path(&self, target: &LockTarget) -> Result<PathBuf, StoreError> {
        let file = match target {
            LockTarget::Registry => "apps.lock".to_string(),
            LockTarget::History(key) if key.is_path_safe() => format!("history-{key}.lock"),
            LockTarget::History(key) => return Err(StoreError::InvalidKey(key.clone())),
        };
        Ok(self.root.join(LOCK_DIR).join(file))
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let content = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::Serialize { what, source })?;

    let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, content).await.map_err(io_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(e));
    }

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[async_trait]
impl Backend for FileBackend {
    async fn load_apps(&self) -> Result<Registry, StoreError> {
        read_json(&self.apps_path()).await
    }

    async fn save_apps(&self, registry: &Registry) -> Result<(), StoreError> {
        write_json(&self.apps_path(), registry, "apps").await
    }

    async fn load_history(&self, key: &AccessKey) -> Result<PackageHistory, StoreError> {
        read_json(&self.history_path(key)?).await
    }

    async fn save_history(
        &self,
        key: &AccessKey,
        history: &PackageHistory,
    ) -> Result<(), StoreError> {
        write_json(&self.history_path(key)?, history, "history").await
    }

    async fn delete_history(&self, key: &AccessKey) -> Result<(), StoreError> {
        let path = self.history_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn try_lock(&self, target: &LockTarget) -> Result<Option<StoreLock>, StoreError> {
        let path = self.lock_path(target)?;
        let resource = target.to_string();

        let mut acquired = lock_file::try_create(&path, &resource).await?;
        if !acquired && lock_file::break_if_stale(&path).await? {
            acquired = lock_file::try_create(&path, &resource).await?;
        }
        if !acquired {
            return Ok(None);
        }

        tracing::debug!("Locked {}", path.display());
        Ok(Some(StoreLock::new(target.clone(), move || {
            lock_file::release(&path)
        })))
    }
}
