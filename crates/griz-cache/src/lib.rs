//! [`Cache`](griz_core::Cache) backends.
//!
//! - [`InMemoryCache`]: a lock-guarded map, for tests and single-process runs
//! - [`MokaCache`]: bounded in-process cache with per-entry expiry
//! - [`RedisCache`]: shared cache for multi-instance deployments

mod memory;
mod moka;
mod redis;

pub use self::memory::InMemoryCache;
pub use self::moka::{MokaCache, MokaCacheConfig};
pub use self::redis::RedisCache;
