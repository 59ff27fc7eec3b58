use async_trait::async_trait;
use griz_core::cache::{effective_ttl, Result};
use griz_core::{Cache, CacheError, CacheKey};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

const DEFAULT_PREFIX: &str = "griz:";

/// A Redis-backed [`Cache`].
///
/// Keys are stored as `<prefix><Namespace>_<raw>` and expire through
/// `SET ... PX`, so TTLs are enforced by the server.
#[derive(Debug, Clone)]
pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisCache {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_PREFIX)
    }

    /// Creates a cache whose keys all start with `key_prefix`, e.g. `"myapp:"`.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    fn cache_key(&self, key: &CacheKey<'_>) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &CacheKey<'_>) -> Result<Option<String>> {
        let redis_key = self.cache_key(key);
        trace!(key = %key, "Fetching value from Redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&redis_key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "Cache hit in Redis");
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(key = %key, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, key: &CacheKey<'_>, value: &str, ttl: Option<Duration>) -> Result<()> {
        let redis_key = self.cache_key(key);
        trace!(key = %key, ?ttl, "Storing value in Redis");

        let mut conn = self.conn.clone();
        let result = match effective_ttl(ttl) {
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex::<_, _, ()>(&redis_key, value, millis).await
            }
            None => conn.set::<_, _, ()>(&redis_key, value).await,
        };

        result.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to store value in Redis");
            map_redis_error("failed to write value to Redis", e)
        })
    }

    async fn del(&self, key: &CacheKey<'_>) -> Result<()> {
        let redis_key = self.cache_key(key);
        trace!(key = %key, "Removing value from Redis");

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&redis_key).await.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to delete value from Redis");
            map_redis_error("failed to delete value from Redis", e)
        })
    }
}
