//! Configuration Module
//!
//! Handles loading process configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheOptions;
use crate::error::{CacheError, Result};

/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backing store address (host:port)
    pub store_addr: String,
    /// Backing store password, if any
    pub store_password: Option<String>,
    /// Backing store database index
    pub store_db: i64,
    /// Data hash key of the cache registered at startup
    pub cache_key: String,
    /// Lifetime of cached entries in seconds
    pub data_ttl: u64,
    /// Lifetime of rate counters in seconds
    pub times_ttl: u64,
    /// Rate limit per counter window (0 or less disables it)
    pub rate_limit: i64,
    /// Initial capacity (and growth increment) of the schedule queues
    pub queue_capacity: usize,
    /// Fallback sleep of the sweep workers in seconds
    pub retry_interval: u64,
    /// Interval of the periodic active sweep in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_ADDR` - Store address (default: 127.0.0.1:6379)
    /// - `STORE_PASSWORD` - Store password (default: none)
    /// - `STORE_DB` - Store database index (default: 0)
    /// - `CACHE_KEY` - Cache data hash key (default: hashcache)
    /// - `DATA_TTL` - Entry TTL in seconds (default: 300)
    /// - `TIMES_TTL` - Rate counter TTL in seconds (default: 3600)
    /// - `RATE_LIMIT` - Rate limit, 0 disables (default: 0)
    /// - `QUEUE_CAPACITY` - Schedule queue capacity (default: 64)
    /// - `RETRY_INTERVAL` - Worker fallback sleep in seconds (default: 60)
    /// - `SWEEP_INTERVAL` - Active sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_addr: env::var("STORE_ADDR").unwrap_or(defaults.store_addr),
            store_password: env::var("STORE_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
            store_db: parse_var("STORE_DB").unwrap_or(defaults.store_db),
            cache_key: env::var("CACHE_KEY").unwrap_or(defaults.cache_key),
            data_ttl: parse_var("DATA_TTL").unwrap_or(defaults.data_ttl),
            times_ttl: parse_var("TIMES_TTL").unwrap_or(defaults.times_ttl),
            rate_limit: parse_var("RATE_LIMIT").unwrap_or(defaults.rate_limit),
            queue_capacity: parse_var("QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
            retry_interval: parse_var("RETRY_INTERVAL").unwrap_or(defaults.retry_interval),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    /// Rejects values the sweep workers cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_key.is_empty() {
            return Err(CacheError::Config("CACHE_KEY cannot be empty".to_string()));
        }
        // a zero idle interval turns the lazy sweep into a busy loop
        if self.data_ttl == 0 {
            return Err(CacheError::Config("DATA_TTL must be positive".to_string()));
        }
        if self.rate_limit > 0 && self.times_ttl == 0 {
            return Err(CacheError::Config(
                "TIMES_TTL must be positive when RATE_LIMIT is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the store connection URL, e.g. `redis://:secret@127.0.0.1:6379/0`.
    pub fn store_url(&self) -> String {
        match &self.store_password {
            Some(password) => format!("redis://:{}@{}/{}", password, self.store_addr, self.store_db),
            None => format!("redis://{}/{}", self.store_addr, self.store_db),
        }
    }

    /// Cache options derived from this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            data_ttl: Duration::from_secs(self.data_ttl),
            times_ttl: Duration::from_secs(self.times_ttl),
            rate_limit: self.rate_limit,
            initial_queue_capacity: self.queue_capacity,
            retry_interval: Duration::from_secs(self.retry_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_addr: "127.0.0.1:6379".to_string(),
            store_password: None,
            store_db: 0,
            cache_key: "hashcache".to_string(),
            data_ttl: 300,
            times_ttl: 3600,
            rate_limit: 0,
            queue_capacity: 64,
            retry_interval: 60,
            sweep_interval: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.store_addr, "127.0.0.1:6379");
        assert!(config.store_password.is_none());
        assert_eq!(config.data_ttl, 300);
        assert_eq!(config.times_ttl, 3600);
        assert_eq!(config.rate_limit, 0);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.sweep_interval, 60);
    }

    #[test]
    fn test_config_from_env_defaults() {
        for name in [
            "STORE_ADDR",
            "STORE_PASSWORD",
            "STORE_DB",
            "CACHE_KEY",
            "DATA_TTL",
            "TIMES_TTL",
            "RATE_LIMIT",
            "QUEUE_CAPACITY",
            "RETRY_INTERVAL",
            "SWEEP_INTERVAL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.cache_key, "hashcache");
        assert_eq!(config.data_ttl, 300);
        assert_eq!(config.retry_interval, 60);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let empty_key = Config {
            cache_key: String::new(),
            ..Config::default()
        };
        assert!(matches!(empty_key.validate(), Err(CacheError::Config(_))));

        let zero_ttl = Config {
            data_ttl: 0,
            ..Config::default()
        };
        assert!(matches!(zero_ttl.validate(), Err(CacheError::Config(_))));

        let zero_window = Config {
            rate_limit: 3,
            times_ttl: 0,
            ..Config::default()
        };
        assert!(matches!(zero_window.validate(), Err(CacheError::Config(_))));
    }

    #[test]
    fn test_store_url() {
        let mut config = Config::default();
        assert_eq!(config.store_url(), "redis://127.0.0.1:6379/0");

        config.store_password = Some("secret".to_string());
        config.store_db = 2;
        assert_eq!(config.store_url(), "redis://:secret@127.0.0.1:6379/2");
    }

    #[test]
    fn test_cache_options_from_config() {
        let config = Config {
            rate_limit: 3,
            data_ttl: 10,
            ..Config::default()
        };
        let options = config.cache_options();
        assert_eq!(options.data_ttl, Duration::from_secs(10));
        assert_eq!(options.times_ttl, Duration::from_secs(3600));
        assert_eq!(options.rate_limit, 3);
        assert_eq!(options.initial_queue_capacity, 64);
    }
}
