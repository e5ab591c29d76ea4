//! Result cache for execution outcomes.
//!
//! [`ResultCache`] is the seam the orchestrator talks to. Values are opaque
//! strings (serialized outcomes); the cache never interprets them.

use std::sync::Arc;
use std::time::Duration;

mod memory;
mod redis_cache;

pub use memory::{MemoryCache, NoopCache};
pub use redis_cache::RedisCache;

/// Errors raised by a cache backend. Callers treat every one as a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

/// Key/value store with per-entry expiry.
#[async_trait::async_trait]
pub trait ResultCache: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Round-trip to the backend without touching real entries.
    async fn health_check(&self) -> Result<(), CacheError>;
}

pub type SharedCache = Arc<dyn ResultCache>;

/// Build a cache from a URL.
///
/// | Value          | Backend        |
/// |----------------|----------------|
/// | empty          | [`NoopCache`]  |
/// | `memory`       | [`MemoryCache`]|
/// | `redis://...`  | [`RedisCache`] |
///
/// Redis connects lazily, so an unreachable server does not fail startup.
pub fn connect(url: &str, op_timeout: Duration) -> Result<SharedCache, CacheError> {
    let url = url.trim();
    let cache: SharedCache = match url {
        "" => Arc::new(NoopCache),
        "memory" => Arc::new(MemoryCache::new()),
        _ => Arc::new(RedisCache::open(url, op_timeout)?),
    };
    tracing::info!(backend = cache.backend(), "Result cache configured");
    Ok(cache)
}
