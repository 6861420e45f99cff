//! Key-value store capability for stateful tokens.
//!
//! The token core needs three commands from its backing store:
//!
//! - `GET key` returning the value or nothing
//! - `SET key value` with a per-key time-to-live
//! - `DEL key`, where deleting a missing key succeeds
//!
//! plus an optional atomic `GETDEL key` for single-use redemption.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - process-local `DashMap`, for tests and single-instance setups
//! - [`RedisStore`] - Redis through a `deadpool-redis` pool (feature `redis`)

mod error;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage trait for TTL-bound key-value records.
///
/// Implementations must provide atomicity for individual key operations.
/// Nothing more is assumed: there is no cross-key consistency and no retry.
///
/// # Example Implementation
///
/// ```ignore
/// use tokenward::store::{KeyValueStore, StoreResult};
///
/// struct NullStore;
///
/// #[async_trait::async_trait]
/// impl KeyValueStore for NullStore {
///     async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
///         Ok(None)
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the key does not exist or its TTL has lapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the command fails.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value, and sets
    /// the key to expire after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the command fails.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()>;

    /// Removes `key`.
    ///
    /// # Idempotency
    ///
    /// Deleting a key that does not exist must succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the command fails.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Reads and removes `key`.
    ///
    /// Backends that can do this in one atomic command should override the
    /// default, which is a `get` followed by a `delete`. Only an atomic
    /// `take` guarantees that a value is handed out once.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the command fails.
    async fn take(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value = self.get(key).await?;
        if value.is_some() {
            self.delete(key).await?;
        }
        Ok(value)
    }
}
