//! Memory Store Module
//!
//! In-process implementation of [`HashStore`], used for single-process
//! deployments and for tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{CacheError, Result};
use crate::store::HashStore;

// == Plain Key ==
/// A raw key written by `set_if_absent`.
#[derive(Debug, Clone)]
struct PlainKey {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl PlainKey {
    /// Expired once the current time reaches the expiration time.
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    hashes: HashMap<String, HashMap<String, String>>,
    keys: HashMap<String, PlainKey>,
    offline: bool,
    failing: HashSet<String>,
}

impl MemoryState {
    fn check(&self, key: &str) -> Result<()> {
        if self.offline {
            return Err(CacheError::Store("store is offline".to_string()));
        }
        if self.failing.contains(key) {
            return Err(CacheError::Store(format!("command on {} failed", key)));
        }
        Ok(())
    }

    /// Drops `key` if its TTL has elapsed.
    fn purge_expired(&mut self, key: &str) {
        if self.keys.get(key).is_some_and(PlainKey::is_expired) {
            self.keys.remove(key);
        }
    }
}

// == Memory Store ==
/// Hash maps and expiring plain keys held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every command fail (or succeed again) as if the store were unreachable.
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    /// Makes every command touching `key` fail.
    pub async fn fail_key(&self, key: &str) {
        self.state.write().await.failing.insert(key.to_string());
    }

    /// Undoes [`fail_key`](Self::fail_key).
    pub async fn restore_key(&self, key: &str) {
        self.state.write().await.failing.remove(key);
    }

    /// Reads a plain key written by `set_if_absent`, if it is still live.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.state
            .read()
            .await
            .keys
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Number of fields in the hash `key`.
    pub async fn hash_len(&self, key: &str) -> usize {
        self.state
            .read()
            .await
            .hashes
            .get(key)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        let state = self.state.read().await;
        if state.offline {
            return Err(CacheError::Store("store is offline".to_string()));
        }
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.check(key)?;
        state
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let state = self.state.read().await;
        state.check(key)?;
        Ok(state
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field))
            .cloned())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.check(key)?;
        if let Some(hash) = state.hashes.get_mut(key) {
            hash.remove(field);
            if hash.is_empty() {
                state.hashes.remove(key);
            }
        }
        Ok(())
    }

    async fn hash_vals(&self, key: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        state.check(key)?;
        Ok(state
            .hashes
            .get(key)
            .map(|hash| hash.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut state = self.state.write().await;
        state.check(key)?;
        state.purge_expired(key);
        if state.keys.contains_key(key) || state.hashes.contains_key(key) {
            return Ok(false);
        }

        // out-of-range TTLs saturate to the latest representable instant
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(
                chrono::Duration::from_std(ttl)
                    .ok()
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            )
        };
        state.keys.insert(
            key.to_string(),
            PlainKey {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        state.check(key)?;
        state.purge_expired(key);
        let removed_key = state.keys.remove(key).is_some();
        let removed_hash = state.hashes.remove(key).is_some();
        Ok(u64::from(removed_key || removed_hash))
    }
}
