use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::utils::constants::DEFAULT_CACHE_MAX_ENTRIES;

/// Key-value store with per-entry TTL. Only `get`/`set` are relied upon;
/// storage, eviction and persistence belong to the implementation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl_seconds`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache store: key -> (value, deadline)
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    max_entries: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner.read().await.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let map = self.inner.read().await;
            match map.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }
        // expired: drop it
        let mut map = self.inner.write().await;
        if map.get(key).is_some_and(|entry| entry.is_expired(now)) {
            map.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<()> {
        let now = Instant::now();
        let mut map = self.inner.write().await;
        if ttl_seconds == 0 {
            map.remove(key);
            return Ok(());
        }

        if !map.contains_key(key) && map.len() >= self.max_entries {
            map.retain(|_, entry| !entry.is_expired(now));
            if map.len() >= self.max_entries {
                let oldest = map
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!("cache full, evicting '{}'", oldest);
                    map.remove(&oldest);
                }
            }
        }

        map.insert(
            key.to_owned(),
            Entry { value, expires_at: now + Duration::from_secs(ttl_seconds) },
        );
        Ok(())
    }
}
