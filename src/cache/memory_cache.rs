use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

use super::{CacheEntry, CacheStore};
use crate::error::CacheError;

/// Bounded in-process tier. Least recently used entries go first once full.
pub struct MemoryCache {
    store: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            store: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let mut store = self.store.lock().await;
        if let Some(entry) = store.get(key).cloned() {
            if !entry.is_expired_at(Utc::now()) {
                return Ok(Some(entry));
            }
            store.pop(key);
        }
        Ok(None)
    }

    async fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        if entry.is_expired() {
            return Ok(());
        }
        self.store.lock().await.put(key.to_string(), entry.clone());
        Ok(())
    }
}
