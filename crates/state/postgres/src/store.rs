use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use tracing::debug;

use slotguard_state::error::StateError;
use slotguard_state::store::LockStore;

use crate::config::PostgresConfig;
use crate::migrations;

/// Parse the connection URL and apply `ssl_mode` / `ssl_root_cert`.
///
/// `ssl_mode` accepts the libpq names (`disable`, `prefer`, `require`,
/// `verify-ca`, `verify-full`, ...).
pub fn build_connect_options(config: &PostgresConfig) -> Result<PgConnectOptions, StateError> {
    let mut options: PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| StateError::InvalidConfig(format!("postgres url: {e}")))?;

    if let Some(mode) = config.ssl_mode.as_deref() {
        let mode: PgSslMode = mode
            .parse()
            .map_err(|e: sqlx::Error| StateError::InvalidConfig(format!("ssl_mode {mode:?}: {e}")))?;
        options = options.ssl_mode(mode);
    }
    if let Some(path) = config.ssl_root_cert.as_deref() {
        options = options.ssl_root_cert(path);
    }
    Ok(options)
}

/// PostgreSQL-backed implementation of [`LockStore`].
///
/// Each lock is a row in `{prefix}locks`. Acquisition is a single
/// `INSERT .. ON CONFLICT DO UPDATE .. WHERE expires_at <= NOW()` so taking
/// over an expired row and inserting a fresh one are the same atomic
/// statement.
pub struct PostgresLockStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresLockStore {
    /// Connect, create the pool and run migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if pool creation fails, or
    /// [`StateError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StateError> {
        let connect_options = build_connect_options(&config)?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(connect_options)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Create a `PostgresLockStore` from an existing pool and config.
    ///
    /// Useful for sharing one pool with the reservation store. Runs
    /// migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StateError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Remove expired rows. Correctness never depends on this; it only keeps
    /// the table small.
    pub async fn purge_expired(&self) -> Result<u64, StateError> {
        let table = self.config.locks_table();
        let query = format!("DELETE FROM {table} WHERE expires_at <= NOW()");

        let result = sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        debug!(purged = result.rows_affected(), "expired slot locks purged");
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LockStore for PostgresLockStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StateError> {
        let table = self.config.locks_table();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        let query = format!(
            "INSERT INTO {table} AS l (name, owner, expires_at) \
             VALUES ($1, $2, NOW() + make_interval(secs => $3::double precision / 1000.0)) \
             ON CONFLICT (name) DO UPDATE \
             SET owner = EXCLUDED.owner, expires_at = EXCLUDED.expires_at \
             WHERE l.expires_at <= NOW()"
        );

        let result = sqlx::query(&query)
            .bind(key)
            .bind(value)
            .bind(ttl_ms)
            .execute(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StateError> {
        let table = self.config.locks_table();

        // An expired row still owned by us is cleaned up but reported as not
        // deleted, matching a store with native expiry.
        let query = format!(
            "DELETE FROM {table} WHERE name = $1 AND owner = $2 \
             RETURNING expires_at > NOW()"
        );

        let row: Option<(bool,)> = sqlx::query_as(&query)
            .bind(key)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(row.is_some_and(|(live,)| live))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let table = self.config.locks_table();
        let query = format!("SELECT owner FROM {table} WHERE name = $1 AND expires_at > NOW()");

        let row: Option<(String,)> = sqlx::query_as(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(row.map(|(owner,)| owner))
    }
}


#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> PostgresConfig {
        PostgresConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/slotguard_test".to_string()),
            table_prefix: format!("test_{}_", uuid::Uuid::new_v4().simple()),
            ..PostgresConfig::default()
        }
    }

    #[tokio::test]
    async fn lock_store_conformance() {
        let store = PostgresLockStore::new(test_config())
            .await
            .expect("pool creation should succeed");
        slotguard_state::testing::run_lock_store_conformance_tests(&store)
            .await
            .expect("lock store conformance tests should pass");
    }

    #[tokio::test]
    async fn manager_conformance() {
        let store = PostgresLockStore::new(test_config())
            .await
            .expect("pool creation should succeed");
        slotguard_state::testing::run_manager_conformance_tests(Arc::new(store))
            .await
            .expect("manager conformance tests should pass");
    }
}
