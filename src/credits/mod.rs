//! Cached access to the Cachet credits feed
//!
//! [`Credits`] fetches the credits document at most once per cache window and
//! never reports failure to its caller: a disabled fetcher, a failed request
//! and a previously cached failure all come back as [`FetchResult::Absent`].
//! Failures are cached as [`CreditsEntry::Failed`] so a broken upstream is not
//! hit again until the entry expires.

pub mod client;

pub use client::{user_agent, CreditsClient, CreditsError, DEFAULT_TIMEOUT, PRODUCT_NAME};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Repository, Store};

/// Default location of the credits feed
pub const DEFAULT_URL: &str = "https://cachethq.io/credits";

/// Cache key the credits document is stored under
pub const CACHE_KEY: &str = "credits";

/// Lifetime of a cached credits entry (or cached failure), in minutes
pub const CACHE_TTL_MINUTES: u64 = 2880;

/// Outcome of a credits lookup
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// The credits document
    Value(Value),
    /// Disabled, failed, or a cached failure
    Absent,
}

impl FetchResult {
    pub fn is_absent(&self) -> bool {
        matches!(self, FetchResult::Absent)
    }

    /// Borrow the payload, if any
    pub fn value(&self) -> Option<&Value> {
        match self {
            FetchResult::Value(value) => Some(value),
            FetchResult::Absent => None,
        }
    }
}

impl From<FetchResult> for Option<Value> {
    fn from(result: FetchResult) -> Self {
        match result {
            FetchResult::Value(value) => Some(value),
            FetchResult::Absent => None,
        }
    }
}

/// What is stored in the cache under [`CACHE_KEY`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum CreditsEntry {
    /// A successfully fetched document
    Payload(Value),
    /// The last fetch failed
    Failed,
}

impl From<CreditsEntry> for FetchResult {
    fn from(entry: CreditsEntry) -> Self {
        match entry {
            CreditsEntry::Payload(Value::Null) | CreditsEntry::Failed => FetchResult::Absent,
            CreditsEntry::Payload(value) => FetchResult::Value(value),
        }
    }
}

/// Configuration for a [`Credits`] fetcher
#[derive(Debug, Clone)]
pub struct CreditsConfig {
    /// Whether outbound requests are allowed at all
    pub enabled: bool,
    /// Credits feed URL; an empty string means [`DEFAULT_URL`]
    pub url: String,
    /// Version reported in the `User-Agent` header
    pub product_version: Option<String>,
    /// Connect and total request timeout
    pub timeout: Duration,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_URL.to_string(),
            product_version: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CreditsConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_product_version(mut self, version: impl Into<String>) -> Self {
        self.product_version = Some(version.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches the credits feed through a shared cache
///
/// Holds only immutable configuration; all state lives in the repository,
/// which may be shared by any number of fetchers.
#[derive(Debug)]
pub struct Credits<S> {
    cache: Arc<Repository<S>>,
    client: CreditsClient,
    enabled: bool,
}

impl<S: Store> Credits<S> {
    /// Creates a new fetcher over `cache`
    ///
    /// # Returns
    /// * `Err(CreditsError)` only if the HTTP client cannot be constructed
    pub fn new(cache: Arc<Repository<S>>, config: CreditsConfig) -> Result<Self, CreditsError> {
        let url = if config.url.is_empty() {
            DEFAULT_URL.to_string()
        } else {
            config.url
        };
        let agent = user_agent(config.product_version.as_deref());
        let client = CreditsClient::new(url, &agent, config.timeout)?;

        Ok(Self {
            cache,
            client,
            enabled: config.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn url(&self) -> &str {
        self.client.url()
    }

    /// Returns the latest credits
    ///
    /// Served from the cache when possible; otherwise fetched once and cached
    /// for [`CACHE_TTL_MINUTES`], whether the fetch succeeded or not.
    pub async fn latest(&self) -> FetchResult {
        if !self.enabled {
            tracing::debug!("credits disabled, skipping fetch");
            return FetchResult::Absent;
        }

        let entry: CreditsEntry = self
            .cache
            .remember(CACHE_KEY, CACHE_TTL_MINUTES, move || self.produce())
            .await;

        entry.into()
    }

    /// Drops any cached entry and fetches again
    pub async fn refresh(&self) -> FetchResult {
        if !self.enabled {
            return FetchResult::Absent;
        }

        if let Err(err) = self.cache.forget(CACHE_KEY).await {
            tracing::warn!(error = %err, "failed to clear cached credits");
        }
        self.latest().await
    }

    async fn produce(&self) -> CreditsEntry {
        tracing::debug!(url = self.client.url(), "fetching credits");
        match self.client.fetch().await {
            Ok(value) => CreditsEntry::Payload(value),
            Err(err) => {
                tracing::warn!(url = self.client.url(), error = %err, "credits fetch failed");
                CreditsEntry::Failed
            }
        }
    }
}
