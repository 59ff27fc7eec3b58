use async_trait::async_trait;
use griz_core::cache::{effective_ttl, Result};
use griz_core::{Cache, CacheKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// A map behind a read/write lock.
///
/// Expired entries are never returned. Every `set` drops them while it holds
/// the write lock, and [`InMemoryCache::purge_expired`] does so on demand.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Slot>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        purge(&mut self.entries.write(), Instant::now())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn purge(entries: &mut HashMap<String, Slot>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, slot| slot.is_live(now));
    before - entries.len()
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &CacheKey<'_>) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read();
        match entries.get(&key.to_string()) {
            Some(slot) if slot.is_live(now) => {
                debug!(key = %key, "Cache hit in memory");
                Ok(Some(slot.value.clone()))
            }
            _ => {
                trace!(key = %key, "Cache miss in memory");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey<'_>, value: &str, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let expires_at = effective_ttl(ttl).map(|ttl| now + ttl);

        let mut entries = self.entries.write();
        let purged = purge(&mut entries, now);
        entries.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at,
            },
        );
        trace!(key = %key, ?ttl, purged, "Stored value in memory");
        Ok(())
    }

    async fn del(&self, key: &CacheKey<'_>) -> Result<()> {
        self.entries.write().remove(&key.to_string());
        trace!(key = %key, "Removed value from memory (if present)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn set_then_get() {
        let cache = InMemoryCache::new();
        let key = CacheKey::HashUrl("v01abc");

        assert_eq!(cache.get(&key).await.unwrap(), None);

        cache.set(&key, "https://example.com", None).await.unwrap();
        assert_eq!(
            cache.get(&key).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = InMemoryCache::new();
        let key = CacheKey::AuthToken("tok");

        cache.set(&key, "1", None).await.unwrap();
        cache.set(&key, "2", None).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("2"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let cache = InMemoryCache::new();
        cache
            .set(&CacheKey::HashUrl("k"), "hash", None)
            .await
            .unwrap();
        cache
            .set(&CacheKey::SocialUrl("k"), "social", None)
            .await
            .unwrap();

        assert_eq!(
            cache.get(&CacheKey::HashUrl("k")).await.unwrap().as_deref(),
            Some("hash")
        );
        assert_eq!(
            cache.get(&CacheKey::SocialUrl("k")).await.unwrap().as_deref(),
            Some("social")
        );
        assert_eq!(cache.get(&CacheKey::AuthToken("k")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let cache = InMemoryCache::new();
        let key = CacheKey::HashUrl("gone");

        cache.del(&key).await.unwrap();
        cache.set(&key, "v", None).await.unwrap();
        cache.del(&key).await.unwrap();
        cache.del(&key).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = InMemoryCache::new();
        let key = CacheKey::SocialUrl("post");

        cache
            .set(&key, "v", Some(Duration::from_millis(30)))
            .await
            .unwrap();
        assert!(cache.get(&key).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn set_drops_expired_entries() {
        let cache = InMemoryCache::new();

        let ttl = Some(Duration::from_millis(20));
        for i in 0..5 {
            let raw = format!("post{i}");
            let key = CacheKey::SocialUrl(&raw);
            cache.set(&key, "v", ttl).await.unwrap();
        }
        assert_eq!(cache.len(), 5);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let live = CacheKey::HashUrl("live");
        cache.set(&live, "v", None).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&live).await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn zero_ttl_never_expires() {
        let cache = InMemoryCache::new();
        let key = CacheKey::HashUrl("forever");

        cache.set(&key, "v", Some(Duration::ZERO)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn concurrent_access() {
        let cache = Arc::new(InMemoryCache::new());

        let mut handles = vec![];
        for i in 0..10 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let raw = format!("k{i}");
                let key = CacheKey::HashUrl(&raw);
                cache.set(&key, &i.to_string(), None).await.unwrap();
                cache.get(&key).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), Some(i.to_string()));
        }
        assert_eq!(cache.len(), 10);
    }
}
