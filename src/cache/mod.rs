//! Cache Module
//!
//! Expiring, rate-limited hash caches kept in the backing store, with lazy
//! (queue-driven) and active (scan-driven) expiry.

mod config;
mod entry;
mod expiring;
mod queue;
mod registry;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use config::{CacheOptions, TIMES_KEY_SUFFIX};
pub use entry::{CacheData, CacheTimes};
pub use expiring::ExpiringCache;
pub use queue::{RingQueue, ScheduleToken};
pub use registry::{CacheRegistry, SweepReport};
pub use stats::SweepStats;
