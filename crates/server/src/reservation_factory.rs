use std::sync::Arc;

use slotguard_reservations::ReservationStore;
use slotguard_reservations_memory::MemoryReservationStore;
#[cfg(feature = "postgres")]
use slotguard_reservations_postgres::{PostgresReservationConfig, PostgresReservationStore};

use crate::config::ReservationStoreConfig;
use crate::error::ServerError;

/// Construct the reservation store named by `[reservations] backend`.
pub async fn create_reservation_store(
    config: &ReservationStoreConfig,
) -> Result<Arc<dyn ReservationStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryReservationStore::new())),
        #[cfg(feature = "postgres")]
        "postgres" => create_postgres(config).await,
        other => Err(ServerError::Config(format!(
            "unsupported reservation backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "postgres")]
async fn create_postgres(
    config: &ReservationStoreConfig,
) -> Result<Arc<dyn ReservationStore>, ServerError> {
    let url = config.url.as_deref().ok_or_else(|| {
        ServerError::Config("postgres backend requires 'url' in [reservations]".into())
    })?;
    let mut pg_config = PostgresReservationConfig::new(url);
    if let Some(ref prefix) = config.prefix {
        pg_config = pg_config.with_prefix(prefix.clone());
    }
    if let Some(size) = config.pool_size {
        pg_config = pg_config.with_pool_size(size);
    }
    if let Some(ref mode) = config.ssl_mode {
        pg_config = pg_config.with_ssl_mode(mode.clone());
    }
    if let Some(ref cert) = config.ssl_root_cert {
        pg_config = pg_config.with_ssl_root_cert(cert.clone());
    }
    let store = PostgresReservationStore::new(&pg_config)
        .await
        .map_err(|e| ServerError::Config(format!("postgres reservation store: {e}")))?;
    Ok(Arc::new(store))
}
