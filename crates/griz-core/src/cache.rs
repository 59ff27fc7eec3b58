use crate::error::CacheError;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A namespaced cache key.
///
/// Every namespace renders as `<Namespace>_<raw>` so that the three logical
/// categories share one keyspace without colliding on equal raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey<'a> {
    /// Auth token -> user id.
    AuthToken(&'a str),
    /// Hash token -> source URL.
    HashUrl(&'a str),
    /// Social post link -> source URL.
    SocialUrl(&'a str),
}

impl CacheKey<'_> {
    pub fn namespace(&self) -> &'static str {
        match self {
            CacheKey::AuthToken(_) => "AuthToken",
            CacheKey::HashUrl(_) => "HashUrl",
            CacheKey::SocialUrl(_) => "SocialUrl",
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            CacheKey::AuthToken(raw) | CacheKey::HashUrl(raw) | CacheKey::SocialUrl(raw) => raw,
        }
    }
}

impl Display for CacheKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.namespace(), self.raw())
    }
}

/// A string key/value cache with per-entry expiry.
///
/// Implementations must be safe for concurrent use. Entries may disappear at
/// any time once their TTL elapses, so a miss is routine and is reported as
/// `Ok(None)`; `Err` is reserved for a failing backend.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if it is absent or expired.
    async fn get(&self, key: &CacheKey<'_>) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// `None` and `Some(Duration::ZERO)` both mean the entry never expires.
    async fn set(&self, key: &CacheKey<'_>, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Removes `key`. It is not an error if the key does not exist.
    async fn del(&self, key: &CacheKey<'_>) -> Result<()>;
}

/// Normalizes a requested TTL: zero means "no expiry".
pub fn effective_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|ttl| !ttl.is_zero())
}

#[async_trait]
impl<T: Cache + ?Sized> Cache for Arc<T> {
    async fn get(&self, key: &CacheKey<'_>) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &CacheKey<'_>, value: &str, ttl: Option<Duration>) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn del(&self, key: &CacheKey<'_>) -> Result<()> {
        (**self).del(key).await
    }
}
