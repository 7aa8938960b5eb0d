//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror. Absent values are modeled
//! as `Option::None` by the callers, never as an error variant.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing store unreachable or command failed
    #[error("Store error: {0}")]
    Store(String),

    /// Value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Stored payload does not match the expected structure
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Store(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = CacheError::Store("connection refused".to_string());
        assert_eq!(err.to_string(), "Store error: connection refused");
    }

    #[test]
    fn test_deserialization_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = CacheError::Deserialization(source);
        assert!(err.to_string().starts_with("Deserialization error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
