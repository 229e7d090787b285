pub mod config;
pub mod migrations;
pub mod store;

pub use config::PostgresReservationConfig;
pub use store::PostgresReservationStore;
