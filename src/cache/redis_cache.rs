use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::fmt;
use tracing::{debug, info};

use super::{CacheBackend, CacheEntry, CacheStore};
use crate::error::CacheError;

const KEY_NAMESPACE: &str = "trailer";

/// Shared store reached over the network, for running several instances
/// behind one cache.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let target = CacheBackend::Redis(redis_url.to_string()).describe();
        info!("Connecting to {}", target);

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Connected to {}", target);
        Ok(Self { conn })
    }
}

fn namespaced(key: &str) -> String {
    format!("{KEY_NAMESPACE}:{key}")
}

/// Seconds to hand to `SET ... EX`, rounded up so a live entry never gets a
/// zero expiry. `None` once the entry has expired.
fn expire_secs(entry: &CacheEntry, now: DateTime<Utc>) -> Option<u64> {
    let remaining_ms = (entry.expires_at - now).num_milliseconds();
    if remaining_ms <= 0 {
        return None;
    }
    u64::try_from(remaining_ms).ok().map(|ms| ms.div_ceil(1000))
}

// redis expires the key itself; the expiry check guards against clock skew
fn decode(json: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, CacheError> {
    let entry: CacheEntry = serde_json::from_str(json)?;
    if entry.is_expired_at(now) {
        return Ok(None);
    }
    Ok(Some(entry))
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(namespaced(key)).await?;
        match data {
            Some(json) => decode(&json, Utc::now()),
            None => Ok(None),
        }
    }

    async fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let Some(seconds) = expire_secs(entry, Utc::now()) else {
            debug!(key, "skipping store of expired entry");
            return Ok(());
        };

        let json = serde_json::to_string(entry)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(namespaced(key), json, seconds)
            .await?;
        Ok(())
    }
}
