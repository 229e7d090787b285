use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use slotguard_coordinator::CoordinatorBuilder;
use slotguard_server::api::AppState;
use slotguard_server::config::SlotGuardConfig;
use slotguard_server::lock_factory::create_lock_store;
use slotguard_server::reservation_factory::create_reservation_store;

/// SlotGuard booking HTTP server.
#[derive(Parser, Debug)]
#[command(name = "slotguard-server", about = "Standalone HTTP booking server for SlotGuard")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "slotguard.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create database tables for the configured lock and reservation backends, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_found = Path::new(&cli.config).exists();
    let config: SlotGuardConfig = if config_found {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };

    if let Some(Commands::Migrate) = cli.command {
        slotguard_server::telemetry::init_fmt_only();
        return run_migrate(&config).await;
    }

    let telemetry_guard = slotguard_server::telemetry::init(&config.telemetry);

    if !config_found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let lock_store = create_lock_store(&config.lock).await?;
    info!(backend = %config.lock.backend, "lock store initialized");
    let reservations = create_reservation_store(&config.reservations).await?;
    info!(backend = %config.reservations.backend, "reservation store initialized");

    if config.lock.backend == "memory" {
        warn!("memory lock store only serializes bookings within this process");
    }

    let coordinator = CoordinatorBuilder::new()
        .lock_store(lock_store)
        .reservations(reservations)
        .config(config.coordinator_config())
        .build()?;
    info!(
        ttl_ms = config.lock.ttl_ms,
        store_timeout_ms = config.lock.store_timeout_ms,
        granularity = ?config.booking.granularity,
        "booking coordinator ready"
    );

    let state = AppState::new(coordinator).with_allowed_origins(config.server.allowed_origins.clone());
    let app = slotguard_server::api::router(state);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "slotguard-server listening");

    // Serve in a task so in-flight bookings get a bounded drain window once
    // the shutdown signal arrives.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .await
    });

    // Resolves early (with an error) if the server exits on its own.
    let _ = signalled_rx.await;

    let drain = Duration::from_secs(config.server.shutdown_timeout_seconds);
    match tokio::time::timeout(drain, server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, abandoning in-flight requests"
        ),
    }

    telemetry_guard.shutdown();

    info!("slotguard-server shut down");
    Ok(())
}

/// Run the `migrate` subcommand. Constructing a Postgres-backed store creates
/// its tables, so building both stores is enough.
async fn run_migrate(config: &SlotGuardConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(backend = %config.lock.backend, "running lock store migrations...");
    let _locks = create_lock_store(&config.lock).await?;
    info!(backend = %config.reservations.backend, "running reservation store migrations...");
    let _reservations = create_reservation_store(&config.reservations).await?;
    info!("all migrations complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
