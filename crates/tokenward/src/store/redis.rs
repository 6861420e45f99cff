//! Redis-backed key-value store.
//!
//! Values are written with `PSETEX` so sub-second TTLs keep their precision.
//! All keys are namespaced with a configurable prefix; the prefix never
//! leaks back to callers.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime, redis::AsyncCommands};

use super::{KeyValueStore, StoreError, StoreResult};

/// [`KeyValueStore`] on top of a `deadpool-redis` connection pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisStore {
    /// Wraps an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Redis connection pool
    /// * `key_prefix` - Namespace prepended to every key
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    /// Builds a pool for `url` and wraps it.
    ///
    /// The pool connects lazily, so an unreachable server only surfaces on
    /// the first command.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the URL is invalid or the pool
    /// cannot be created.
    pub fn connect(
        url: &str,
        pool_size: usize,
        key_prefix: impl Into<String>,
    ) -> StoreResult<Self> {
        let mut config = Config::from_url(url);
        config.pool = Some(deadpool_redis::PoolConfig::new(pool_size));

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::connection(e.to_string()))?;

        tracing::debug!(pool_size, "created redis token store pool");
        Ok(Self::new(pool, key_prefix))
    }

    /// Checks that a connection can be checked out of the pool.
    pub async fn is_available(&self) -> bool {
        self.pool.get().await.is_ok()
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection(&self) -> StoreResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<Vec<u8>>>(self.namespaced(key))
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        // PSETEX rejects a zero expiry.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut conn = self.connection().await?;
        conn.pset_ex::<_, _, ()>(self.namespaced(key), value, ttl_ms)
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        // DEL replies with the number of removed keys; zero is fine.
        conn.del::<_, ()>(self.namespaced(key))
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }

    async fn take(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        conn.get_del::<_, Option<Vec<u8>>>(self.namespaced(key))
            .await
            .map_err(|e| StoreError::command(e.to_string()))
    }
}
