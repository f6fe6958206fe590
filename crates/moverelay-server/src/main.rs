//! Move relay server binary.
//!
//! Wires configuration, logging, the ledger store, and the HTTP gateway
//! together and serves until shutdown.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `moverelay-config.yaml` (plus env overrides)
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured ledger store
//! 4. Serve the relay endpoint until Ctrl-C / SIGTERM

mod error;

use std::sync::Arc;

use moverelay_gateway::config::{LogFormat, LoggingConfig};
use moverelay_gateway::{start_server, AppState, RelayConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::RelayServerError;

/// Application entry point for the move relay.
///
/// # Errors
///
/// Returns an error if configuration, store setup, or the server fails.
#[tokio::main]
async fn main() -> Result<(), RelayServerError> {
    // 1. Load configuration (logging depends on it).
    let config = RelayConfig::load()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("moverelay-server starting");
    info!(
        host = config.server.host,
        port = config.server.port,
        max_body_bytes = config.server.max_body_bytes,
        backend = ?config.storage.backend,
        ledger_dir = %config.storage.ledger_dir.display(),
        snapshot_dir = %config.storage.snapshot_dir.display(),
        "Configuration loaded"
    );

    // 3. Open the ledger store.
    let store = config.storage.open_store()?;
    info!(backend = ?config.storage.backend, "Ledger store ready");

    // 4. Serve.
    let state = Arc::new(AppState::new(store).with_max_body_bytes(config.server.max_body_bytes));
    start_server(&config.server, state).await?;

    info!("moverelay-server exited cleanly");
    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence
/// over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), RelayServerError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| RelayServerError::Logging {
        message: e.to_string(),
    })
}
