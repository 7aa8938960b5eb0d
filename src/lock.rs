//! Distributed Lock Module
//!
//! Advisory lock built on the store's set-if-absent. The lock key's existence
//! is the only signal: there is no owner token, so any caller that knows the
//! key name can release it.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::store::SharedStore;

/// Value written under a held lock key.
const LOCK_SENTINEL: &str = "1";

/// Release attempts made by [`DistributedLock::run_exclusive`].
pub const DEFAULT_RELEASE_ATTEMPTS: usize = 3;

/// Pause between release attempts.
pub const DEFAULT_RELEASE_BACKOFF: Duration = Duration::from_millis(10);

// == Distributed Lock ==
/// Cooperative cross-process lock over the backing store.
#[derive(Clone)]
pub struct DistributedLock {
    store: SharedStore,
}

impl DistributedLock {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    // == Try Lock ==
    /// Takes `key` for `ttl`. Returns `false` if it is already held or the
    /// store failed; the two cases are not distinguished.
    pub async fn try_lock(&self, key: &str, ttl: Duration) -> bool {
        match self.store.set_if_absent(key, LOCK_SENTINEL, ttl).await {
            Ok(acquired) => acquired,
            Err(err) => {
                warn!("Lock {}: acquire failed: {}", key, err);
                false
            }
        }
    }

    // == Release Lock ==
    /// Deletes `key`. Returns `true` only if a key was actually removed.
    pub async fn release_lock(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(removed) => removed > 0,
            Err(err) => {
                warn!("Lock {}: release failed: {}", key, err);
                false
            }
        }
    }

    /// Calls [`release_lock`](Self::release_lock) up to `attempts` times,
    /// sleeping `backoff` between failures.
    pub async fn release_with_retry(&self, key: &str, attempts: usize, backoff: Duration) -> bool {
        for attempt in 1..=attempts {
            if self.release_lock(key).await {
                return true;
            }
            if attempt < attempts {
                sleep(backoff).await;
            }
        }
        debug!("Lock {}: not released after {} attempts", key, attempts);
        false
    }

    /// Runs `task` while holding `key`.
    ///
    /// Returns `None` without running `task` when the lock is not acquired.
    /// The lock is released afterwards with the default retry policy.
    pub async fn run_exclusive<F, T>(&self, key: &str, ttl: Duration, task: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if !self.try_lock(key, ttl).await {
            return None;
        }
        let output = task.await;
        self.release_with_retry(key, DEFAULT_RELEASE_ATTEMPTS, DEFAULT_RELEASE_BACKOFF)
            .await;
        Some(output)
    }
}

impl std::fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock").finish_non_exhaustive()
    }
}
