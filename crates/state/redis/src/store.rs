use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::{AsyncCommands, Script};

use slotguard_state::error::StateError;
use slotguard_state::store::LockStore;

use crate::config::RedisConfig;
use crate::scripts;

/// Redis-backed implementation of [`LockStore`].
///
/// Both primitives run server-side in a single command or Lua script, so they
/// are atomic with respect to every other client of the same instance.
pub struct RedisLockStore {
    pool: Pool,
    prefix: String,
    acquire: Script,
    release: Script,
}

impl RedisLockStore {
    /// Create a new `RedisLockStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StateError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StateError::Connection(e.to_string()))?
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
            acquire: Script::new(scripts::LOCK_ACQUIRE),
            release: Script::new(scripts::LOCK_RELEASE),
        })
    }

    /// Build the full Redis key for a lock.
    fn lock_key(&self, name: &str) -> String {
        format!("{}:lock:{}", self.prefix, name)
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
        let mut conn = self.conn().await?;
        let result: i64 = self
            .acquire
            .key(self.lock_key(key))
            .arg(value)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(result == 1)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StateError> {
        let mut conn = self.conn().await?;
        let result: i64 = self
            .release
            .key(self.lock_key(key))
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(result == 1)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let mut conn = self.conn().await?;
        conn.get(self.lock_key(key))
            .await
            .map_err(|e| StateError::Backend(e.to_string()))
    }
}
