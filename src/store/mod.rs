// ABOUTME: Persistence for the app registry and per-deployment histories.
// ABOUTME: Backends are swappable behind an async trait; file and in-memory ship here.

mod error;
mod file;
mod lock_file;
mod memory;

pub use error::StoreError;
pub use file::FileBackend;
pub use lock_file::LockInfo;
pub use memory::MemoryBackend;

use async_trait::async_trait;
use std::fmt;

use crate::history::PackageHistory;
use crate::registry::Registry;
use crate::types::AccessKey;

/// Storage for the registry and histories.
///
/// Each save replaces the stored value whole; readers never observe a
/// partially written history.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn load_apps(&self) -> Result<Registry, StoreError>;

    async fn save_apps(&self, registry: &Registry) -> Result<(), StoreError>;

    /// History for `key`, empty if nothing was ever saved.
    async fn load_history(&self, key: &AccessKey) -> Result<PackageHistory, StoreError>;

    async fn save_history(&self, key: &AccessKey, history: &PackageHistory)
    -> Result<(), StoreError>;

    /// Drop the history for `key`. Missing histories are not an error.
    async fn delete_history(&self, key: &AccessKey) -> Result<(), StoreError>;

    /// Take the exclusive lock on `target` if nobody holds it, or `None`.
    ///
    /// Holders in other processes sharing the same storage count.
    async fn try_lock(&self, target: &LockTarget) -> Result<Option<StoreLock>, StoreError>;
}

/// What a storage lock protects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockTarget {
    Registry,
    History(AccessKey),
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => write!(f, "app registry"),
            Self::History(key) => write!(f, "history {key}"),
        }
    }
}

/// A held storage lock that releases on drop.
pub struct StoreLock {
    target: LockTarget,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl StoreLock {
    pub fn new(target: LockTarget, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            target,
            release: Some(Box::new(release)),
        }
    }

    pub fn target(&self) -> &LockTarget {
        &self.target
    }
}

impl fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLock")
            .field("target", &self.target)
            .finish()
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
