use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when reading or writing a cache store
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem access failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be converted to or from JSON
    #[error("Failed to serialize cache entry: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lock guarding the store was poisoned by a panicking thread
    #[error("Cache lock poisoned for key: {0}")]
    Poisoned(String),
}

/// Key-value storage with per-entry expiry
///
/// Implementations decide how entries are kept; callers only see live
/// values. An entry whose expiry is not in the future must be reported as
/// missing by [`Store::get`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the live value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key` until `expires_at`, replacing any previous entry
    async fn put(&self, key: &str, value: Value, expires_at: DateTime<Utc>) -> Result<(), CacheError>;

    /// Removes the entry under `key`, returning whether one existed
    async fn forget(&self, key: &str) -> Result<bool, CacheError>;
}
