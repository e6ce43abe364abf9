//! Key-value store capability.
//!
//! The accessor never talks to a concrete backend directly; it is handed an
//! implementation of [`KeyValueStore`] when it is constructed. Production uses
//! [`RedisStore`](crate::RedisStore), tests use [`MemoryStore`](crate::MemoryStore).

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::pattern;

/// Error type for store round trips.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal set of operations a cache backend must provide.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Reads the raw value stored under `key`. Expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value and expiry.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Removes `key`. Returns `true` if something was deleted.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Removes every key matching the glob `pattern` and returns how many went away.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, StoreError>;

    /// Removes every key starting with the literal `prefix`.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, StoreError> {
        self.delete_matching(&pattern::prefix(prefix)).await
    }

    /// Round trip used for health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend label for logs.
    fn backend(&self) -> &'static str;
}

/// Store used when caching is switched off.
///
/// Reads always miss and writes are dropped, so callers behave exactly as if
/// no cache existed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl KeyValueStore for DisabledStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, StoreError> {
        Ok(0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_store_always_misses() {
        let store = DisabledStore;
        store
            .set_ex("store:item:1", "{}".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("store:item:1").await.unwrap(), None);
        assert!(!store.delete("store:item:1").await.unwrap());
        assert_eq!(store.delete_by_prefix("store:").await.unwrap(), 0);
    }
}
