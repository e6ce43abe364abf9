//! Cache-aside accessor.
//!
//! [`CacheAccessor`] is what request handlers talk to. It serialises payloads
//! to JSON, applies TTL policy and namespacing, and never lets a cache problem
//! reach the caller: failed reads look like misses and failed writes are
//! logged and dropped. The `try_*` variants keep the error for callers that
//! need to report it, such as the operator CLI.

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::CacheConfig;
use crate::pattern;
use crate::redis::RedisStore;
use crate::store::{DisabledStore, KeyValueStore, StoreError};

/// Error type for accessor operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of a cache read before it is folded into an `Option`.
#[derive(Debug)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
    /// The store could not be read or the payload could not be decoded.
    Failed(CacheError),
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Lookup::Hit(_) => "hit",
            Lookup::Miss => "miss",
            Lookup::Failed(_) => "error",
        }
    }

    /// Collapses the result the way callers see it: failures are misses.
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Failed(_) => None,
        }
    }
}

/// Read-through / write-around access to a shared key-value store.
#[derive(Clone)]
pub struct CacheAccessor {
    store: Arc<dyn KeyValueStore>,
    default_ttl: Duration,
    namespace: Option<String>,
}

impl std::fmt::Debug for CacheAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAccessor")
            .field("backend", &self.store.backend())
            .field("default_ttl", &self.default_ttl)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl CacheAccessor {
    /// Creates an accessor over `store`.
    ///
    /// `default_ttl` is used by [`set_default`](Self::set_default).
    pub fn new(store: Arc<dyn KeyValueStore>, default_ttl: Duration) -> Self {
        Self {
            store,
            default_ttl: normalize_ttl(default_ttl),
            namespace: None,
        }
    }

    /// Prefixes every key and pattern with `<namespace>:`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Builds an accessor from configuration.
    ///
    /// Never fails: a disabled cache or an unusable `REDIS_URL` yields an
    /// accessor over [`DisabledStore`].
    pub fn from_config(config: &CacheConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = if !config.enabled {
            info!("Caching disabled by configuration");
            Arc::new(DisabledStore)
        } else {
            match RedisStore::new(&config.redis_url, config.timeout()) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(error = %e, "Invalid Redis URL, caching disabled");
                    Arc::new(DisabledStore)
                }
            }
        };

        let accessor = Self::new(store, config.default_ttl());
        match &config.key_prefix {
            Some(prefix) => accessor.with_namespace(prefix.clone()),
            None => accessor,
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn full_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.namespace {
            Some(ns) => Cow::Owned(format!("{ns}:{key}")),
            None => Cow::Borrowed(key),
        }
    }

    fn full_pattern<'a>(&self, pattern: &'a str) -> Cow<'a, str> {
        match &self.namespace {
            Some(ns) => Cow::Owned(format!("{}:{pattern}", pattern::escape(ns))),
            None => Cow::Borrowed(pattern),
        }
    }

    /// Reads `key` and reports hit, miss or failure separately.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn lookup<T>(&self, key: &str) -> Lookup<T>
    where
        T: DeserializeOwned,
    {
        let full_key = self.full_key(key);

        let lookup = match self.store.get(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(cache.key = %full_key, "Cache hit");
                    Lookup::Hit(value)
                }
                Err(e) => {
                    error!(cache.key = %full_key, error = %e, "Failed to deserialize cached value");
                    Lookup::Failed(e.into())
                }
            },
            Ok(None) => {
                debug!(cache.key = %full_key, "Cache miss");
                Lookup::Miss
            }
            Err(e) => {
                warn!(cache.key = %full_key, backend = self.store.backend(), error = %e, "Cache read failed, treating as miss");
                Lookup::Failed(e.into())
            }
        };

        counter!("cache_lookups_total", "outcome" => lookup.outcome()).increment(1);
        lookup
    }

    /// Returns the cached value for `key`, or `None` on a miss or any failure.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.lookup(key).await.into_option()
    }

    /// Stores `value` under `key` and reports failures.
    ///
    /// The TTL is rounded up to whole seconds, with a floor of one second.
    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn try_set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let full_key = self.full_key(key);
        let ttl = normalize_ttl(ttl);

        let result = match serde_json::to_string(value) {
            Ok(json) => self
                .store
                .set_ex(&full_key, json, ttl)
                .await
                .map_err(CacheError::from),
            Err(e) => Err(CacheError::from(e)),
        };

        let status = if result.is_ok() { "success" } else { "error" };
        counter!("cache_writes_total", "status" => status).increment(1);

        if result.is_ok() {
            debug!(cache.key = %full_key, cache.ttl_secs = %ttl.as_secs(), "Cache set");
        }
        result
    }

    /// Stores `value` under `key`. Failures are logged, never returned.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: Serialize + ?Sized,
    {
        if let Err(e) = self.try_set(key, value, ttl).await {
            warn!(cache.key = %key, error = %e, "Failed to write cache entry");
        }
    }

    /// [`set`](Self::set) with the accessor's default TTL.
    pub async fn set_default<T>(&self, key: &str, value: &T)
    where
        T: Serialize + ?Sized,
    {
        self.set(key, value, self.default_ttl).await
    }

    /// Deletes a single key and reports failures.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn try_delete(&self, key: &str) -> Result<bool, CacheError> {
        let full_key = self.full_key(key);
        let result = self.store.delete(&full_key).await;
        record_invalidation("key", result.as_ref().map(|removed| u64::from(*removed)));

        if let Ok(removed) = &result {
            debug!(cache.key = %full_key, cache.removed = *removed, "Cache key invalidated");
        }
        Ok(result?)
    }

    /// Deletes a single key. No-op if it does not exist.
    ///
    /// Returns whether a key was removed; `false` if the store could not be reached.
    pub async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Failed to invalidate cache key");
                false
            }
        }
    }

    /// Deletes every key matching the glob `pattern` and reports failures.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    pub async fn try_clear(&self, pattern: &str) -> Result<u64, CacheError> {
        let full_pattern = self.full_pattern(pattern);
        let result = self.store.delete_matching(&full_pattern).await;
        record_invalidation("pattern", result.as_ref().copied());

        if let Ok(deleted) = &result {
            debug!(cache.pattern = %full_pattern, cache.deleted = *deleted, "Pattern invalidation complete");
        }
        Ok(result?)
    }

    /// Deletes every key matching the glob `pattern`.
    ///
    /// Returns the number of keys removed, or `0` if the store could not be reached.
    pub async fn clear(&self, pattern: &str) -> u64 {
        match self.try_clear(pattern).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(cache.pattern = %pattern, error = %e, "Failed to invalidate cache pattern");
                0
            }
        }
    }

    /// Deletes every key starting with the literal `prefix`.
    pub async fn clear_prefix(&self, prefix: &str) -> u64 {
        self.clear(&pattern::prefix(prefix)).await
    }

    /// Cache-aside read path.
    ///
    /// Returns the cached value for `key` if there is one. Otherwise awaits
    /// `compute`, caches a successful result for `ttl` and returns it. Errors
    /// from `compute` are returned unchanged and nothing is cached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }

        let value = compute().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// Checks that the backing store answers.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

fn record_invalidation(kind: &'static str, result: Result<u64, &StoreError>) {
    match result {
        Ok(deleted) => {
            counter!("cache_invalidations_total", "kind" => kind, "status" => "success")
                .increment(1);
            counter!("cache_keys_invalidated_total").increment(deleted);
        }
        Err(_) => {
            counter!("cache_invalidations_total", "kind" => kind, "status" => "error")
                .increment(1);
        }
    }
}

/// Rounds up to whole seconds, never below one.
fn normalize_ttl(ttl: Duration) -> Duration {
    let mut secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs += 1;
    }
    Duration::from_secs(secs.max(1))
}
