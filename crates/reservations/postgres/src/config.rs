use sqlx::postgres::{PgConnectOptions, PgSslMode};

use slotguard_reservations::error::ReservationError;

/// Configuration for the Postgres reservation store.
#[derive(Debug, Clone)]
pub struct PostgresReservationConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Table name prefix (e.g. "slotguard_").
    pub prefix: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// libpq SSL mode name; the URL's own setting applies when unset.
    pub ssl_mode: Option<String>,
    /// CA certificate path used by `verify-ca` and `verify-full`.
    pub ssl_root_cert: Option<String>,
}

impl PostgresReservationConfig {
    /// Create a new configuration with the given URL and defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: "slotguard_".to_owned(),
            pool_size: 5,
            ssl_mode: None,
            ssl_root_cert: None,
        }
    }

    /// Set the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    #[must_use]
    pub fn with_ssl_mode(mut self, mode: impl Into<String>) -> Self {
        self.ssl_mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_ssl_root_cert(mut self, path: impl Into<String>) -> Self {
        self.ssl_root_cert = Some(path.into());
        self
    }

    /// Connection options for the URL with the SSL settings applied.
    pub(crate) fn connect_options(&self) -> Result<PgConnectOptions, ReservationError> {
        let mut options: PgConnectOptions = self
            .url
            .parse()
            .map_err(|e: sqlx::Error| ReservationError::Storage(format!("postgres url: {e}")))?;
        if let Some(mode) = self.ssl_mode.as_deref() {
            let parsed: PgSslMode = mode.parse().map_err(|e: sqlx::Error| {
                ReservationError::Storage(format!("ssl_mode {mode:?}: {e}"))
            })?;
            options = options.ssl_mode(parsed);
        }
        if let Some(path) = self.ssl_root_cert.as_deref() {
            options = options.ssl_root_cert(path);
        }
        Ok(options)
    }

    pub(crate) fn table(&self) -> String {
        format!("{}reservations", self.prefix)
    }
}
