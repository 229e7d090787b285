use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;

use slotguard_core::{
    AnalystId, RequesterId, Reservation, ReservationId, ReservationStatus, SlotKey,
};
use slotguard_reservations::error::ReservationError;
use slotguard_reservations::store::ReservationStore;

use crate::config::PostgresReservationConfig;
use crate::migrations;

/// Postgres-backed reservation store using `sqlx`.
pub struct PostgresReservationStore {
    pool: PgPool,
    table: String,
}

impl PostgresReservationStore {
    /// Create a new store, connecting to Postgres and running migrations.
    pub async fn new(config: &PostgresReservationConfig) -> Result<Self, ReservationError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        Self::from_pool(pool, &config.prefix).await
    }

    /// Create from an existing pool, e.g. one shared with the lock store.
    pub async fn from_pool(pool: PgPool, prefix: &str) -> Result<Self, ReservationError> {
        migrations::run_migrations(&pool, prefix)
            .await
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        Ok(Self {
            pool,
            table: format!("{prefix}reservations"),
        })
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn find_confirmed(&self, slot: &SlotKey) -> Result<Option<Reservation>, ReservationError> {
        let sql = format!(
            "SELECT * FROM {} WHERE analyst_id = $1 AND slot_time = $2 AND status = 'confirmed' LIMIT 1",
            self.table
        );

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(slot.analyst_id().as_str())
            .bind(slot.slot_time())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, reservation: &Reservation) -> Result<(), ReservationError> {
        let sql = format!(
            r"
            INSERT INTO {} (
                id, user_id, analyst_id, slot_time, duration_minutes,
                status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
            self.table
        );

        let duration = i32::try_from(reservation.duration_minutes)
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        let result = sqlx::query(&sql)
            .bind(reservation.id.as_str())
            .bind(reservation.requester_id.as_str())
            .bind(reservation.analyst_id.as_str())
            .bind(reservation.slot_time)
            .bind(duration)
            .bind(reservation.status.as_str())
            .bind(reservation.created_at)
            .bind(reservation.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(ReservationError::Duplicate(reservation.slot_key()))
            }
            Err(e) => Err(ReservationError::Storage(e.to_string())),
        }
    }

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>, ReservationError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table);

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_requester(
        &self,
        requester: &RequesterId,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let sql = format!(
            "SELECT * FROM {} WHERE user_id = $1 ORDER BY slot_time DESC, created_at DESC",
            self.table
        );

        let rows = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(requester.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn cancel(
        &self,
        id: &ReservationId,
        requester: &RequesterId,
    ) -> Result<bool, ReservationError> {
        let sql = format!(
            "UPDATE {} SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'confirmed'",
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(requester.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| ReservationError::Storage(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Internal row type for mapping database rows to `Reservation`.
#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: String,
    user_id: String,
    analyst_id: String,
    slot_time: DateTime<Utc>,
    duration_minutes: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = ReservationError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let status: ReservationStatus = row.status.parse().map_err(|e| {
            warn!(id = %row.id, status = %row.status, "unreadable reservation status");
            ReservationError::Storage(format!("row {}: {e}", row.id))
        })?;
        let duration_minutes = u32::try_from(row.duration_minutes)
            .map_err(|e| ReservationError::Storage(format!("row {}: {e}", row.id)))?;

        Ok(Self {
            id: ReservationId::new(row.id),
            requester_id: RequesterId::new(row.user_id),
            analyst_id: AnalystId::new(row.analyst_id),
            slot_time: row.slot_time,
            duration_minutes,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use slotguard_reservations::testing::run_reservation_store_conformance_tests;

    use super::*;

    fn test_config() -> PostgresReservationConfig {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost:5432/slotguard_test".to_string());
        PostgresReservationConfig::new(url)
            .with_prefix(format!("test_{}_", uuid::Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn conformance() {
        let store = PostgresReservationStore::new(&test_config())
            .await
            .expect("connection should succeed");
        run_reservation_store_conformance_tests(&store)
            .await
            .expect("reservation store conformance tests should pass");
    }
}
