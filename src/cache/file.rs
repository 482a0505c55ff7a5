//! File-backed cache store
//!
//! Stores each entry as a JSON file with its cache and expiry timestamps, so
//! cached credits (and cached failures) survive process restarts.

use super::{CacheError, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// The cached data
    data: Value,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

/// Stores cache entries as JSON files in a directory
///
/// Uses an XDG-compliant cache directory (`~/.cache/cachet-credits/` on
/// Linux) unless constructed with [`FileStore::with_dir`]. Files that are
/// missing, unreadable or corrupt are treated as misses.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileStore {
    /// Creates a new FileStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "cachet-credits")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new FileStore with a custom cache directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory the store writes to
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so a key can never
    /// escape the cache directory.
    fn cache_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{}.json", file_name))
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(key, error = %err, "ignoring corrupt cache file");
                None
            }
        }
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let Some(entry) = self.read_entry(key) else {
            return Ok(None);
        };
        if Utc::now() >= entry.expires_at {
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    async fn put(&self, key: &str, value: Value, expires_at: DateTime<Utc>) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;

        let entry = CacheEntry {
            data: value,
            cached_at: Utc::now(),
            expires_at,
        };
        let json = serde_json::to_string_pretty(&entry)?;

        fs::write(self.cache_path(key), json)?;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        match fs::remove_file(self.cache_path(key)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path());
        (store, temp_dir)
    }

    fn in_one_hour() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[tokio::test]
    async fn test_put_creates_file_in_cache_directory() {
        let (store, temp_dir) = create_test_store();

        store
            .put("credits", json!({"contributors": ["jbrooks"]}), in_one_hour())
            .await
            .expect("Put should succeed");

        let expected_path = temp_dir.path().join("credits.json");
        assert!(expected_path.exists(), "Cache file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"data\""));
        assert!(content.contains("\"expires_at\""));
        assert!(content.contains("jbrooks"));
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();

        let result = store.get("nonexistent_key").await.expect("Get should succeed");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[tokio::test]
    async fn test_get_returns_fresh_value() {
        let (store, _temp_dir) = create_test_store();

        store.put("fresh", json!({"b": 2}), in_one_hour()).await.unwrap();

        assert_eq!(store.get("fresh").await.unwrap(), Some(json!({"b": 2})));
    }

    #[tokio::test]
    async fn test_get_treats_expired_entry_as_miss() {
        let (store, _temp_dir) = create_test_store();

        store
            .put("expired", json!(1), Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert!(store.get("expired").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_treats_corrupt_file_as_miss() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join("broken.json"), "{not json").unwrap();

        assert!(store.get("broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let store = FileStore::with_dir(nested_path.clone());

        store.put("nested_key", json!(true), in_one_hour()).await.unwrap();

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("nested_key.json").exists(), "Cache file should exist");
    }

    #[tokio::test]
    async fn test_forget_removes_file() {
        let (store, temp_dir) = create_test_store();
        store.put("credits", json!(null), in_one_hour()).await.unwrap();

        assert!(store.forget("credits").await.unwrap());
        assert!(!temp_dir.path().join("credits.json").exists());
        assert!(!store.forget("credits").await.unwrap());
    }

    #[tokio::test]
    async fn test_key_cannot_escape_cache_directory() {
        let (store, temp_dir) = create_test_store();

        store.put("../outside", json!(1), in_one_hour()).await.unwrap();

        assert!(temp_dir.path().join("___outside.json").exists());
        assert_eq!(store.get("../outside").await.unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileStore::new() {
            let path_str = store.dir().to_string_lossy();
            assert!(
                path_str.contains("cachet-credits"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}
