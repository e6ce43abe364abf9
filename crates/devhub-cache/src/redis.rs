//! Redis backend.
//!
//! The connection is opened on first use rather than at construction, so a
//! process that starts while Redis is down keeps serving (every cache call
//! misses) and picks the cache up again once Redis is reachable. Only one
//! connect attempt runs at a time; callers arriving meanwhile fail straight
//! away instead of queueing behind it, so no call waits longer than one
//! timeout.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument};

use crate::store::{KeyValueStore, StoreError};

/// Keys fetched per `SCAN` step during pattern deletes.
const SCAN_BATCH: usize = 100;

/// Redis-backed [`KeyValueStore`].
pub struct RedisStore {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    connecting: Mutex<()>,
    timeout: Duration,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("timeout", &self.timeout)
            .field("connected", &self.conn.initialized())
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Creates a store for `redis_url` without connecting.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Redis` if the URL cannot be parsed.
    pub fn new(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;

        Ok(Self {
            client,
            conn: OnceCell::new(),
            connecting: Mutex::new(()),
            timeout,
        })
    }

    /// Runs `fut` under the operation timeout.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    /// Returns a handle to the shared connection, connecting if needed.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn.clone());
        }

        let Ok(_guard) = self.connecting.try_lock() else {
            return Err(StoreError::Unavailable(
                "redis connection attempt in progress".into(),
            ));
        };

        // Another caller may have connected between the check and the lock.
        if let Some(conn) = self.conn.get() {
            return Ok(conn.clone());
        }

        let conn = self
            .bounded(ConnectionManager::new(self.client.clone()))
            .await?;
        info!(redis.addr = %self.client.get_connection_info().addr, "Connected to Redis");
        let _ = self.conn.set(conn.clone());

        Ok(conn)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        // EX takes whole seconds and rejects zero.
        let seconds = ttl.as_secs().max(1);
        self.bounded(conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let removed: u64 = self.bounded(conn.del(key)).await?;
        Ok(removed > 0)
    }

    /// Uses SCAN rather than KEYS so large keyspaces do not block the server.
    #[instrument(skip(self), fields(cache.operation = "SCAN_DEL"))]
    async fn delete_matching(&self, pattern: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = self
                .bounded(
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;

            if !keys.is_empty() {
                let count: u64 = self.bounded(conn.del(&keys)).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(cache.pattern = %pattern, cache.deleted = %deleted, "Pattern delete complete");

        Ok(deleted)
    }

    #[instrument(skip(self), fields(cache.operation = "PING"))]
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: String = self.bounded(redis::cmd("PING").query_async(&mut conn)).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
