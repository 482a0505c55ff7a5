//! Cache-aside repository over a [`Store`]
//!
//! `remember` is the operation the credits fetcher is built on. Concurrent
//! misses for the same key are serialized on a per-key async lock, and the
//! store is re-read once the lock is held, so the producer runs at most once
//! per expiry window even when many tasks ask at the same moment.

use super::{CacheError, Store};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

/// Typed cache access with single-flight `remember`
#[derive(Debug, Default)]
pub struct Repository<S> {
    store: S,
    /// Per-key locks for in-flight producers
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<S: Store> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads and deserializes the live value under `key`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key` for `ttl_minutes` minutes
    pub async fn put<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_minutes: u64,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.store.put(key, value, expiry_after(ttl_minutes)).await
    }

    /// Removes the entry under `key`, returning whether one existed
    pub async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        self.store.forget(key).await
    }

    /// Returns the value under `key`, computing and storing it with
    /// `producer` if it is missing or expired
    ///
    /// Store failures never reach the caller: an unreadable entry counts as a
    /// miss, and a value that cannot be written is still returned.
    pub async fn remember<T, F, Fut>(&self, key: &str, ttl_minutes: u64, producer: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.cached(key).await {
            return value;
        }

        let lock = self.key_lock(key);
        let value = {
            let _guard = lock.lock().await;
            // Another task may have filled the entry while we waited.
            match self.cached(key).await {
                Some(value) => value,
                None => {
                    tracing::debug!(key, "cache miss, running producer");
                    let value = producer().await;
                    if let Err(err) = self.put(key, &value, ttl_minutes).await {
                        tracing::warn!(key, error = %err, "failed to store cache entry");
                    }
                    value
                }
            }
        };
        self.release_key_lock(key, lock);

        value
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(key, "cache hit");
                Some(value)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read cache entry, treating as miss");
                None
            }
        }
    }

    fn key_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    fn release_key_lock(&self, key: &str, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // The table and `lock` are the only holders left.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn pending_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Absolute expiry `ttl_minutes` from now, saturating at the latest representable time
fn expiry_after(ttl_minutes: u64) -> DateTime<Utc> {
    i64::try_from(ttl_minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
