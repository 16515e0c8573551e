use redis::AsyncCommands;

use crate::store::{StoreClient, StoreError};

/// String key/value operations over the pooled store connection.
///
/// Every call borrows one connection and performs a single round trip.
/// Nothing is cached locally.
#[derive(Clone)]
pub struct CacheService {
    store: StoreClient,
}

impl CacheService {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    /// Store `value` under `key` with no expiry, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.store.connection().await?;
        let _: () = conn.set(key, value).await?;
        tracing::debug!("SET {}", key);
        Ok(())
    }

    /// Store `value` under `key`, expiring after `ttl_seconds`.
    ///
    /// Redis rejects a zero expiry; callers validate before getting here.
    pub async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.store.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        tracing::debug!("SETEX {} {}s", key, ttl_seconds);
        Ok(())
    }

    /// Current value of `key`, or `None` if it is missing or expired.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.store.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Remove `key`, reporting whether it existed.
    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.store.connection().await?;
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    // Part of the facade; no HTTP route maps to it.
    #[allow(dead_code)]
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.store.connection().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    /// PING the store. Any failure reads as "not connected".
    pub async fn is_connected(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Redis connectivity check failed: {}", e);
                false
            }
        }
    }

    /// DBSIZE of the active database, or `-1` if it cannot be read.
    pub async fn approximate_key_count(&self) -> i64 {
        match self.db_size().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Redis key count failed: {}", e);
                -1
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.store.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }

    async fn db_size(&self) -> Result<i64, StoreError> {
        let mut conn = self.store.connection().await?;
        let count: i64 = redis::cmd("DBSIZE").query_async(&mut *conn).await?;
        Ok(count)
    }
}
