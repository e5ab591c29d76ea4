use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::{CacheError, ResultCache};

/// Entry count that triggers the first sweep of expired entries.
const SWEEP_THRESHOLD: usize = 1024;

/// In-process cache for single-instance deployments and tests.
#[derive(Default)]
pub struct MemoryCache {
    inner: RwLock<Entries>,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, (String, Instant)>,
    /// Map size at which `set` next sweeps expired entries.
    sweep_at: usize,
}

impl Entries {
    /// Drop expired entries once the map has grown past the sweep mark. The
    /// next mark is twice the surviving size, so sweeps stay amortized O(1).
    fn sweep_if_due(&mut self, now: Instant) {
        if self.map.len() < self.sweep_at.max(SWEEP_THRESHOLD) {
            return;
        }
        self.map.retain(|_, (_, expires_at)| *expires_at > now);
        self.sweep_at = (self.map.len() * 2).max(SWEEP_THRESHOLD);
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .read()
            .await
            .map
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl ResultCache for MemoryCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.inner.read().await;
            match entries.map.get(key) {
                None => return Ok(None),
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
            }
        }
        let mut entries = self.inner.write().await;
        if entries.map.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
            entries.map.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.inner.write().await;
        entries.sweep_if_due(now);
        entries
            .map
            .insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Cache that stores nothing. Used when caching is disabled.
pub struct NoopCache;

#[async_trait::async_trait]
impl ResultCache for NoopCache {
    fn backend(&self) -> &'static str {
        "none"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
