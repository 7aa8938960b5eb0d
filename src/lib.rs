//! hashcache - Expiring hash caches and an advisory lock over a key-value store
//!
//! Provides time-bounded, rate-limited caches with lazy and active expiry, and
//! a set-if-absent distributed lock, on top of any [`store::HashStore`].

pub mod cache;
pub mod config;
pub mod error;
pub mod lock;
pub mod store;
pub mod tasks;

pub use cache::{CacheOptions, CacheRegistry, ExpiringCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use lock::DistributedLock;
pub use store::{HashStore, MemoryStore, SharedStore};
pub use tasks::spawn_sweep_task;
