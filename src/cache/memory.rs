use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use crate::error::CacheError;

use super::Cache;

struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-process cache client: a capacity-bounded LRU map. Entries without a
/// TTL live until evicted by the capacity policy or overwritten.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::new("cache mutex poisoned"))?;

        let expired = matches!(
            entries.peek(key),
            Some(entry) if entry.expires_at.is_some_and(|at| at <= Instant::now())
        );
        if expired {
            entries.pop(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.bytes.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::new("cache mutex poisoned"))?;

        entries.put(
            key.to_string(),
            Entry {
                bytes: value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::new("cache mutex poisoned"))?;

        entries.pop(key);
        Ok(())
    }
}
