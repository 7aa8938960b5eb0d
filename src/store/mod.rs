//! Store Module
//!
//! The backing key-value store consumed by the cache and the lock: hash-map
//! commands plus an atomic set-if-absent and a raw delete.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

/// Shared handle to a backing store, passed to every cache and lock.
pub type SharedStore = Arc<dyn HashStore>;

// == Hash Store ==
/// Commands the backing store must provide.
///
/// Reads of missing keys or fields succeed with an empty result; every
/// failure is reported as [`CacheError::Store`](crate::error::CacheError::Store).
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Verifies the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Writes `value` under `field` in the hash `key`.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Reads `field` from the hash `key`.
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Removes `field` from the hash `key`. Missing fields are not an error.
    async fn hash_delete(&self, key: &str, field: &str) -> Result<()>;

    /// Returns every value stored in the hash `key`.
    async fn hash_vals(&self, key: &str) -> Result<Vec<String>>;

    /// Sets `key` to `value` with a TTL only if the key does not exist.
    ///
    /// Returns `true` when the key was set.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Deletes `key`, returning the number of keys removed.
    async fn delete(&self, key: &str) -> Result<u64>;
}
