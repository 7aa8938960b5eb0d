//! Cache Entry Module
//!
//! Stored payloads: cached values and rate counters, each carrying the time
//! at which it should be cleared.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Cache Data ==
/// A cached value stored under one field of the data hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    /// Field name within the data hash
    pub field: String,
    /// The cached payload
    pub value: serde_json::Value,
    /// When the entry expires
    pub clear_time: DateTime<Utc>,
}

impl CacheData {
    // == Constructor ==
    /// Creates an entry expiring `ttl` from now.
    pub fn new(field: impl Into<String>, value: serde_json::Value, ttl: Duration) -> Self {
        Self {
            field: field.into(),
            value,
            clear_time: expires_after(ttl),
        }
    }

    /// Decodes the payload into `T`.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone()).map_err(CacheError::Deserialization)
    }

    pub fn is_expired(&self) -> bool {
        is_due(self.clear_time)
    }
}

// == Cache Times ==
/// A rate counter stored under one field of the times hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheTimes {
    #[serde(rename = "dataKey")]
    pub field: String,
    /// Number of recorded hits in the current window
    pub times: i64,
    /// When the window closes
    pub clear_time: DateTime<Utc>,
}

impl CacheTimes {
    /// Starts a window with a single hit.
    pub fn first(field: impl Into<String>, ttl: Duration) -> Self {
        Self {
            field: field.into(),
            times: 1,
            clear_time: expires_after(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        is_due(self.clear_time)
    }
}

// == Utility Functions ==
/// Returns the instant `ttl` from now, saturating on overflow.
pub fn expires_after(ttl: Duration) -> DateTime<Utc> {
    let now = Utc::now();
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A clear time is due once it is not after the current time.
pub fn is_due(clear_time: DateTime<Utc>) -> bool {
    clear_time <= Utc::now()
}

/// Time left until `clear_time`, or `None` if it is already due.
pub fn time_until(clear_time: DateTime<Utc>) -> Option<Duration> {
    (clear_time - Utc::now())
        .to_std()
        .ok()
        .filter(|remaining| !remaining.is_zero())
}

/// Serializes a stored payload.
pub(crate) fn encode<T: Serialize>(payload: &T) -> Result<String> {
    serde_json::to_string(payload).map_err(CacheError::Serialization)
}

/// Parses a stored payload; an empty string counts as absent.
pub(crate) fn decode<T: DeserializeOwned>(raw: &str) -> Result<Option<T>> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(CacheError::Deserialization)
}
