//! Process-local key-value store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{KeyValueStore, StoreResult};

/// Number of inserts between two sweeps of expired entries.
pub const SWEEP_INTERVAL: usize = 128;

/// A stored value with its expiry.
#[derive(Clone, Debug)]
struct StoredEntry {
    data: Arc<Vec<u8>>,
    /// `None` when `now + ttl` is past the clock's range: never expires.
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn new(data: &[u8], ttl: Duration) -> Self {
        Self {
            data: Arc::new(data.to_vec()),
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory [`KeyValueStore`] backed by a `DashMap`.
///
/// Expired entries are dropped lazily on read, and the whole map is swept
/// every [`SWEEP_INTERVAL`] inserts. [`MemoryStore::purge_expired`] runs a
/// sweep on demand. State is lost with the process, so this store only fits
/// tests and single-instance deployments.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
    inserts: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "purged expired entries from memory store");
        }
        purged
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.data.as_ref().clone()));
            }
            drop(entry);
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        self.entries.insert(key.to_string(), StoredEntry::new(value, ttl));

        let inserts = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserts % SWEEP_INTERVAL == 0 {
            self.purge_expired();
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(_, entry)| entry.data.as_ref().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store
            .set("k", b"value", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let store = MemoryStore::new();
        store.set("k", b"one", Duration::from_secs(60)).await.unwrap();
        store.set("k", b"two", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_missing() {
        let store = MemoryStore::new();
        store
            .set("k", b"value", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("k", b"value", Duration::from_secs(60)).await.unwrap();

        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("never-set").await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set("short", b"a", Duration::from_millis(10)).await.unwrap();
        store.set("long", b"b", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_entries_swept_on_insert() {
        let store = MemoryStore::new();
        for i in 0..SWEEP_INTERVAL - 1 {
            store
                .set(&format!("short-{i}"), b"a", Duration::from_millis(5))
                .await
                .unwrap();
        }
        assert_eq!(store.len(), SWEEP_INTERVAL - 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        // The next insert completes an interval and sweeps the map
        store.set("long", b"b", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let store = MemoryStore::new();
        store
            .set("k", b"value", Duration::from_secs(u64::MAX / 2))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_take_removes_entry() {
        let store = MemoryStore::new();
        store.set("k", b"value", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.take("k").await.unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.take("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_take_ignores_expired_entry() {
        let store = MemoryStore::new();
        store.set("k", b"value", Duration::from_millis(5)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.take("k").await.unwrap(), None);
    }
}
