//! Cache-aside layer for read-heavy queries. The cache is a plain key-value
//! boundary; the backing store stays the source of truth and any cache
//! failure degrades to a miss.

mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, ServiceError};

pub use memory::MemoryCache;

/// The key-value boundary a cache client implements. A remote client such
/// as Redis sits behind the same three operations.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Deterministic cache keys: a fixed entity-kind prefix plus the identifying
/// parameter.
pub mod keys {
    pub fn user_transactions(user_id: i64) -> String {
        format!("transactions:user:{user_id}")
    }

    pub fn account_transactions(account_id: i64) -> String {
        format!("transactions:account:{account_id}")
    }

    pub fn category_transactions(category_id: i64) -> String {
        format!("transactions:category:{category_id}")
    }
}

#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<dyn Cache>,
}

impl CacheStore {
    pub fn new<C: Cache + 'static>(cache: C) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    /// Serve `key` from the cache when a stored entry deserializes, otherwise
    /// run `loader` against the backing store and populate the cache with its
    /// result. Population is fire-and-forget: the loader's value is returned
    /// even when the cache write fails.
    pub async fn fetch<T, F, Fut>(&self, key: &str, loader: F) -> Result<T, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        match self.inner.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    tracing::debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(key, %err, "discarding malformed cache entry");
                }
            },
            Ok(None) => tracing::debug!(key, "cache miss"),
            Err(err) => tracing::warn!(key, %err, "cache lookup failed, using backing store"),
        }

        let value = loader().await?;

        match serde_json::to_vec(&value) {
            Ok(bytes) => {
                if let Err(err) = self.inner.set(key, bytes, None).await {
                    tracing::warn!(key, %err, "failed to populate cache");
                }
            }
            Err(err) => tracing::warn!(key, %err, "failed to serialize value for cache"),
        }

        Ok(value)
    }

    /// Best-effort removal of the given keys after a successful mutation.
    pub async fn invalidate(&self, keys: &[String]) {
        for key in keys {
            if let Err(err) = self.inner.delete(key).await {
                tracing::warn!(key, %err, "failed to invalidate cache entry");
            }
        }
    }
}
