use async_trait::async_trait;
use griz_core::cache::{effective_ttl, Result};
use griz_core::{Cache, CacheKey};
use moka::future::Cache as MokaInner;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<Duration>,
}

/// Expires every entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// A bounded in-process cache backed by Moka.
///
/// Unlike a plain Moka cache, the TTL is chosen per write, so the three
/// namespaces can each keep their own lifetime inside one instance.
#[derive(Debug, Clone)]
pub struct MokaCache {
    cache: MokaInner<String, Entry>,
}

impl MokaCache {
    /// Creates a cache holding at most 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        MokaCacheConfig::builder()
            .max_capacity(max_capacity)
            .build()
            .into()
    }

    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MokaCache {
    async fn get(&self, key: &CacheKey<'_>) -> Result<Option<String>> {
        match self.cache.get(&key.to_string()).await {
            Some(entry) => {
                debug!(key = %key, "Cache hit in Moka");
                Ok(Some(entry.value))
            }
            None => {
                trace!(key = %key, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey<'_>, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            ttl: effective_ttl(ttl),
        };
        self.cache.insert(key.to_string(), entry).await;
        trace!(key = %key, ?ttl, "Stored value in Moka");
        Ok(())
    }

    async fn del(&self, key: &CacheKey<'_>) -> Result<()> {
        self.cache.invalidate(&key.to_string()).await;
        trace!(key = %key, "Removed value from Moka (if present)");
        Ok(())
    }
}

/// Configuration for a [`MokaCache`].
#[derive(Debug, TypedBuilder)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = DEFAULT_CAPACITY)]
    max_capacity: u64,
    /// Evicts entries not read for this long, regardless of their TTL.
    #[builder(default, setter(strip_option))]
    tti: Option<Duration>,
}

impl From<MokaCacheConfig> for MokaCache {
    fn from(config: MokaCacheConfig) -> Self {
        let mut builder = MokaInner::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl);

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        MokaCache {
            cache: builder.build(),
        }
    }
}
