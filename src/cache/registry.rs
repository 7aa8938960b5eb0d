//! Cache Registry Module
//!
//! Owns the store handle and every cache built on it, so one periodic task
//! can run the active sweeps for all of them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheOptions, ExpiringCache};
use crate::lock::DistributedLock;
use crate::store::SharedStore;

// == Sweep Report ==
/// Result of one active sweep over all registered caches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Caches swept
    pub caches: usize,
    /// Expired entries removed
    pub data_removed: usize,
    /// Expired rate counters removed
    pub times_removed: usize,
}

impl SweepReport {
    pub fn total_removed(&self) -> usize {
        self.data_removed + self.times_removed
    }
}

// == Cache Registry ==
/// Registry of caches sharing one backing store.
pub struct CacheRegistry {
    store: SharedStore,
    defaults: CacheOptions,
    caches: RwLock<HashMap<String, Arc<ExpiringCache>>>,
}

impl CacheRegistry {
    // == Constructor ==
    /// Creates an empty registry; `defaults` apply to caches registered without options.
    pub fn new(store: SharedStore, defaults: CacheOptions) -> Self {
        Self {
            store,
            defaults,
            caches: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn defaults(&self) -> &CacheOptions {
        &self.defaults
    }

    // == Register ==
    /// Returns the cache for `key`, creating it (and starting its workers) on
    /// first use. Options given for an already registered key are ignored.
    pub async fn register(&self, key: &str, options: Option<CacheOptions>) -> Arc<ExpiringCache> {
        let mut caches = self.caches.write().await;
        if let Some(cache) = caches.get(key) {
            return cache.clone();
        }

        let options = options.unwrap_or_else(|| self.defaults.clone());
        let cache = Arc::new(ExpiringCache::new(self.store.clone(), key, options));
        caches.insert(key.to_string(), cache.clone());
        info!("Registered cache {} ({} total)", key, caches.len());
        cache
    }

    /// Looks up a registered cache.
    pub async fn cache(&self, key: &str) -> Option<Arc<ExpiringCache>> {
        self.caches.read().await.get(key).cloned()
    }

    /// Data keys of all registered caches, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.caches.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// A lock over the same store.
    pub fn lock(&self) -> DistributedLock {
        DistributedLock::new(self.store.clone())
    }

    // == Active Sweep ==
    /// Runs both active sweeps on every registered cache.
    pub async fn cron_clear_expired(&self) -> SweepReport {
        // Snapshot so registration is not blocked while the store is scanned.
        let caches: Vec<Arc<ExpiringCache>> = self.caches.read().await.values().cloned().collect();

        let mut report = SweepReport {
            caches: caches.len(),
            ..SweepReport::default()
        };
        for cache in caches {
            report.data_removed += cache.cron_clear_expired_data().await;
            if cache.options().rate_limited() {
                report.times_removed += cache.cron_clear_expired_times().await;
            }
        }
        report
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
