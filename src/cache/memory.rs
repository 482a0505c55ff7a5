use super::{CacheError, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
struct MemoryEntry {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// Process-local store backed by a mutex-guarded map
///
/// Expired entries are dropped lazily, the next time their key is read.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
        key: &str,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>, CacheError> {
        self.data
            .lock()
            .map_err(|_| CacheError::Poisoned(key.to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut data = self.lock(key)?;
        let now = Utc::now();
        match data.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                data.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value, expires_at: DateTime<Utc>) -> Result<(), CacheError> {
        let mut data = self.lock(key)?;
        data.insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let mut data = self.lock(key)?;
        Ok(data.remove(key).is_some())
    }
}
