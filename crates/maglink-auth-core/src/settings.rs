//! Cached settings fetch
//!
//! Runtime settings (hash salt, key id) live in an external parameter
//! backend. This layer memoizes lookups with a TTL and coalesces
//! concurrent fetches of the same parameter into a single in-flight
//! request, so a burst of callers cannot stampede the backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

/// A parameter backend supplied by the environment (e.g. a parameter
/// store client). Implementations fetch the current value for a name.
#[async_trait]
pub trait SettingsSource: Send + Sync + 'static {
    /// Fetch the value for a parameter name
    async fn fetch(&self, name: &str) -> Result<String, SettingsError>;
}

/// Settings fetch errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    /// The parameter does not exist in the backend
    #[error("unknown parameter: {0}")]
    Unknown(String),

    /// Backend failure
    #[error("settings backend error: {0}")]
    Backend(String),
}

/// Configuration for the settings cache
#[derive(Debug, Clone)]
pub struct SettingsCacheConfig {
    /// TTL for cached parameter values.
    /// Default: 5 minutes
    pub ttl: Duration,
    /// Maximum number of cached parameters.
    /// Default: 64
    pub max_entries: u64,
}

impl Default for SettingsCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_entries: 64,
        }
    }
}

impl SettingsCacheConfig {
    /// Create a new cache config with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value TTL
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of cached parameters
    #[must_use]
    pub fn with_max_entries(mut self, max: u64) -> Self {
        self.max_entries = max;
        self
    }
}

/// TTL-cached, request-coalescing settings reader.
///
/// Concurrent `get` calls for the same parameter share one in-flight
/// fetch; the losers await the winner's outcome instead of issuing
/// duplicate requests.
#[derive(Clone)]
pub struct CachedSettings<S> {
    source: Arc<S>,
    cache: Cache<String, Arc<String>>,
}

impl<S: SettingsSource> CachedSettings<S> {
    /// Create a cached reader over a settings source
    pub fn new(source: S, config: SettingsCacheConfig) -> Self {
        Self {
            source: Arc::new(source),
            cache: Cache::builder()
                .time_to_live(config.ttl)
                .max_capacity(config.max_entries)
                .build(),
        }
    }

    /// Get a parameter value, from cache or the backend.
    ///
    /// # Errors
    /// Propagates the source's fetch error; failed fetches are not cached.
    pub async fn get(&self, name: &str) -> Result<Arc<String>, SettingsError> {
        let source = Arc::clone(&self.source);
        let key = name.to_string();
        self.cache
            .try_get_with(key.clone(), async move {
                tracing::debug!(parameter = %key, "fetching setting");
                source.fetch(&key).await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<SettingsError>| (*e).clone())
    }

    /// Drop every cached value, forcing fresh fetches
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl<S> std::fmt::Debug for CachedSettings<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSettings")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}
