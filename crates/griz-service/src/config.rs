use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SOCIAL_RESOLVE_TIMEOUT: Duration = Duration::from_secs(20);

/// Expiry and deadline settings of a [`crate::CodeService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceConfig {
    /// Lifetime of an issued auth token, both in the cache and in its `exp` claim.
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub auth_token_ttl: Duration,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub hash_ttl: Duration,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub social_link_ttl: Duration,
    /// Upper bound for resolving a hash token.
    #[builder(default = DEFAULT_RESOLVE_TIMEOUT)]
    pub resolve_timeout: Duration,
    /// Upper bound for resolving a social link, photo scanning included.
    #[builder(default = DEFAULT_SOCIAL_RESOLVE_TIMEOUT)]
    pub social_resolve_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
