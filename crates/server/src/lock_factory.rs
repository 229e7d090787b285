use std::sync::Arc;

use slotguard_state::LockStore;
use slotguard_state_memory::MemoryLockStore;
#[cfg(feature = "postgres")]
use slotguard_state_postgres::{PostgresConfig, PostgresLockStore};
#[cfg(feature = "redis")]
use slotguard_state_redis::{RedisConfig, RedisLockStore};

use crate::config::LockStoreConfig;
use crate::error::ServerError;

/// Construct the slot lock store named by `[lock] backend`.
pub async fn create_lock_store(config: &LockStoreConfig) -> Result<Arc<dyn LockStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryLockStore::new())),
        #[cfg(feature = "redis")]
        "redis" => create_redis(config),
        #[cfg(feature = "postgres")]
        "postgres" => create_postgres(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported lock backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "redis")]
fn create_redis(config: &LockStoreConfig) -> Result<Arc<dyn LockStore>, ServerError> {
    let defaults = RedisConfig::default();
    let redis_config = RedisConfig {
        url: config.url.clone().unwrap_or(defaults.url),
        prefix: config.prefix.clone().unwrap_or(defaults.prefix),
        pool_size: config.pool_size.unwrap_or(defaults.pool_size),
        ..RedisConfig::default()
    };
    let store = RedisLockStore::new(&redis_config)
        .map_err(|e| ServerError::Config(format!("redis lock store: {e}")))?;
    Ok(Arc::new(store))
}

#[cfg(feature = "postgres")]
async fn create_postgres(config: &LockStoreConfig) -> Result<Arc<dyn LockStore>, ServerError> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| ServerError::Config("postgres backend requires 'url' in [lock]".into()))?;
    let defaults = PostgresConfig::default();
    let pg_config = PostgresConfig {
        url: url.to_owned(),
        table_prefix: config.prefix.clone().unwrap_or(defaults.table_prefix),
        pool_size: config
            .pool_size
            .map_or(defaults.pool_size, |n| u32::try_from(n).unwrap_or(u32::MAX)),
        ssl_mode: config.ssl_mode.clone(),
        ssl_root_cert: config.ssl_root_cert.clone(),
        ..PostgresConfig::default()
    };
    let store = PostgresLockStore::new(pg_config)
        .await
        .map_err(|e| ServerError::Config(format!("postgres lock store: {e}")))?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_builds() {
        let store = create_lock_store(&LockStoreConfig::default()).await.unwrap();
        assert!(store.get("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_backend_is_config_error() {
        let config = LockStoreConfig {
            backend: "zookeeper".into(),
            ..LockStoreConfig::default()
        };
        let err = create_lock_store(&config).await.err().expect("should fail");
        assert!(matches!(err, ServerError::Config(ref m) if m.contains("zookeeper")));
    }
}
