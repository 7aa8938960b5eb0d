//! Options for a single expiring cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Suffix appended to the data hash key to name the rate-counter hash.
pub const TIMES_KEY_SUFFIX: &str = "_times";

/// Per-cache options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Lifetime of cached entries
    pub data_ttl: Duration,

    /// Lifetime of a rate-counter window
    pub times_ttl: Duration,

    /// Hits allowed per window; zero or less disables rate limiting
    pub rate_limit: i64,

    /// Initial size and growth increment of the schedule queues
    pub initial_queue_capacity: usize,

    /// How long a sweep worker backs off after a failed or empty read
    pub retry_interval: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            data_ttl: Duration::from_secs(300),
            times_ttl: Duration::from_secs(3600),
            rate_limit: 0,
            initial_queue_capacity: 64,
            retry_interval: Duration::from_secs(60),
        }
    }
}

impl CacheOptions {
    /// Sets the entry lifetime
    pub fn data_ttl(mut self, ttl: Duration) -> Self {
        self.data_ttl = ttl;
        self
    }

    /// Enables rate limiting with `limit` hits per `window`
    pub fn rate_limit(mut self, limit: i64, window: Duration) -> Self {
        self.rate_limit = limit;
        self.times_ttl = window;
        self
    }

    /// Sets the schedule queue size
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.initial_queue_capacity = capacity;
        self
    }

    /// Sets the worker back-off interval
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn rate_limited(&self) -> bool {
        self.rate_limit > 0
    }
}
