// ABOUTME: In-memory backend for tests and embedding.
// ABOUTME: Whole values are swapped under a lock, so reads see complete snapshots.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::{Backend, LockTarget, StoreError, StoreLock};
use crate::history::PackageHistory;
use crate::registry::Registry;
use crate::types::AccessKey;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    apps: Mutex<Registry>,
    histories: Mutex<HashMap<AccessKey, PackageHistory>>,
    held: Arc<Mutex<HashSet<LockTarget>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored histories.
    pub fn history_count(&self) -> usize {
        self.histories.lock().len()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn load_apps(&self) -> Result<Registry, StoreError> {
        Ok(self.apps.lock().clone())
    }

    async fn save_apps(&self, registry: &Registry) -> Result<(), StoreError> {
        *self.apps.lock() = registry.clone();
        Ok(())
    }

    async fn load_history(&self, key: &AccessKey) -> Result<PackageHistory, StoreError> {
        Ok(self.histories.lock().get(key).cloned().unwrap_or_default())
    }

    async fn save_history(
        &self,
        key: &AccessKey,
        history: &PackageHistory,
    ) -> Result<(), StoreError> {
        self.histories.lock().insert(key.clone(), history.clone());
        Ok(())
    }

    async fn delete_history(&self, key: &AccessKey) -> Result<(), StoreError> {
        self.histories.lock().remove(key);
        Ok(())
    }

    async fn try_lock(&self, target: &LockTarget) -> Result<Option<StoreLock>, StoreError> {
        if !self.held.lock().insert(target.clone()) {
            return Ok(None);
        }
        let held = Arc::clone(&self.held);
        let released = target.clone();
        Ok(Some(StoreLock::new(target.clone(), move || {
            held.lock().remove(&released);
        })))
    }
}
