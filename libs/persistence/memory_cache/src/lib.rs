//! In-process TTL cache for aggregate query results.
//!
//! Entries are whole serialized payloads keyed by namespaced strings, so a
//! concurrent overwrite is last-write-wins and a partially written value
//! cannot be observed. Expiry is per entry: a moka policy evicts at the
//! deadline and reads re-check it, so a value past its TTL is absent even
//! if still resident.

use std::time::{Duration, Instant};

use bytes::Bytes;
use moka::{Expiry, future::Cache};
use serde::{Serialize, de::DeserializeOwned};

pub const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Clone)]
struct CacheEntry {
    payload: Bytes,
    expires_at: Instant,
}

struct EntryDeadline;

impl Expiry<String, CacheEntry> for EntryDeadline {
    fn expire_after_create(
        &self, _key: &String, value: &CacheEntry, created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self, _key: &String, value: &CacheEntry, updated_at: Instant,
        _current: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(updated_at))
    }
}

/// Explicitly constructed, injectable TTL store. Cloning is cheap and all
/// clones share the same underlying cache.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .expire_after(EntryDeadline)
                .build(),
        }
    }

    /// Returns the stored value only while its TTL has not elapsed.
    pub async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(entry) = self.inner.get(key).await else {
            return Ok(None);
        };

        if Instant::now() > entry.expires_at {
            self.inner.invalidate(key).await;
            return Ok(None);
        }

        let value = serde_json::from_slice(&entry.payload)
            .map_err(|e| CacheError::Deserialization(e.to_string()))?;
        Ok(Some(value))
    }

    /// Stores a value for `ttl`, unconditionally replacing any prior entry
    /// for the key.
    pub async fn set<T>(
        &self, key: &str, value: &T, ttl: Duration,
    ) -> CacheResult<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(value)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let entry = CacheEntry {
            payload: Bytes::from(payload),
            expires_at: Instant::now() + ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> bool {
        let existed = self.inner.contains_key(key);
        self.inner.invalidate(key).await;
        existed
    }

    pub fn entry_count(&self) -> u64 { self.inner.entry_count() }
}

impl Default for MemoryCache {
    fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: i64,
    }

    fn payload(name: &str, count: i64) -> Payload {
        Payload {
            name: name.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn set_then_get_within_ttl_returns_value() {
        let cache = MemoryCache::default();
        let value = payload("fantasy", 42);

        cache
            .set("tags:top:book:20", &value, Duration::from_secs(60))
            .await
            .unwrap();

        let got: Option<Payload> =
            cache.get("tags:top:book:20").await.unwrap();
        assert_eq!(got, Some(value));
    }

    #[tokio::test]
    async fn get_after_ttl_elapsed_is_absent() {
        let cache = MemoryCache::default();
        cache
            .set("tags:top:all:20", &payload("x", 1), Duration::from_millis(30))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        let got: Option<Payload> = cache.get("tags:top:all:20").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let cache = MemoryCache::default();
        cache
            .set("tags:top:book:20", &payload("a", 1), Duration::from_secs(60))
            .await
            .unwrap();

        let other: Option<Payload> =
            cache.get("tags:top:author:20").await.unwrap();
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn set_overwrites_unconditionally() {
        let cache = MemoryCache::default();
        cache
            .set("k", &payload("old", 1), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("k", &payload("new", 2), Duration::from_secs(60))
            .await
            .unwrap();

        let got: Option<Payload> = cache.get("k").await.unwrap();
        assert_eq!(got, Some(payload("new", 2)));
    }

    #[tokio::test]
    async fn remove_drops_the_entry() {
        let cache = MemoryCache::default();
        cache
            .set("k", &payload("gone", 1), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.remove("k").await);
        assert!(!cache.remove("k").await);

        let got: Option<Payload> = cache.get("k").await.unwrap();
        assert_eq!(got, None);
        cache.inner.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn fresh_set_revives_an_expired_key() {
        let cache = MemoryCache::default();
        cache
            .set("k", &payload("stale", 1), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        cache
            .set("k", &payload("fresh", 2), Duration::from_secs(60))
            .await
            .unwrap();

        let got: Option<Payload> = cache.get("k").await.unwrap();
        assert_eq!(got, Some(payload("fresh", 2)));
    }
}
