// ABOUTME: Locks serializing registry writes and per-deployment history mutations.
// ABOUTME: Waits in-process first, then on the backend's cross-process lock, up to a timeout.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;

use crate::store::{Backend, LockTarget, StoreError, StoreLock};
use crate::types::{AccessKey, DeploymentName};

/// How often a lock held by another process is re-checked.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LockBusy {
    #[error("deployment {deployment} is busy; gave up after {waited:?}")]
    Deployment {
        deployment: DeploymentName,
        waited: Duration,
    },

    #[error("the app registry is busy; gave up after {waited:?}")]
    Registry { waited: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error(transparent)]
    Busy(#[from] LockBusy),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lock table for everything one service writes.
///
/// Tasks of the same service queue on an async mutex per target, so only
/// one of them at a time polls the backend lock shared with other processes.
#[derive(Debug)]
pub struct Locks {
    slots: Mutex<HashMap<LockTarget, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

impl Locks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Wait for exclusive access to the history of the deployment with `key`.
    pub async fn deployment<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &AccessKey,
        deployment: &DeploymentName,
    ) -> Result<HeldLock, LockError> {
        let busy = LockBusy::Deployment {
            deployment: deployment.clone(),
            waited: self.timeout,
        };
        self.acquire(backend, LockTarget::History(key.clone()), busy)
            .await
    }

    /// Wait for exclusive access to the app registry.
    pub async fn registry<B: Backend + ?Sized>(&self, backend: &B) -> Result<HeldLock, LockError> {
        let busy = LockBusy::Registry {
            waited: self.timeout,
        };
        self.acquire(backend, LockTarget::Registry, busy).await
    }

    async fn acquire<B: Backend + ?Sized>(
        &self,
        backend: &B,
        target: LockTarget,
        busy: LockBusy,
    ) -> Result<HeldLock, LockError> {
        let deadline = Instant::now() + self.timeout;
        let slot = self.slots.lock().entry(target.clone()).or_default().clone();

        tracing::debug!("Acquiring lock on {}", target);
        let Ok(guard) = tokio::time::timeout_at(deadline, slot.lock_owned()).await else {
            tracing::warn!("{}", busy);
            return Err(busy.into());
        };

        loop {
            if let Some(store) = backend.try_lock(&target).await? {
                return Ok(HeldLock {
                    store,
                    _guard: guard,
                });
            }
            if Instant::now() >= deadline {
                tracing::warn!("{}", busy);
                return Err(busy.into());
            }
            tokio::time::sleep_until((Instant::now() + POLL_INTERVAL).min(deadline)).await;
        }
    }

    /// Forget the slot for a deleted deployment.
    pub fn forget(&self, key: &AccessKey) {
        self.slots.lock().remove(&LockTarget::History(key.clone()));
    }
}

/// A held lock that releases on drop.
pub struct HeldLock {
    store: StoreLock,
    _guard: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for HeldLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeldLock")
            .field("target", self.store.target())
            .finish()
    }
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        tracing::debug!("Released lock on {}", self.store.target());
    }
}
