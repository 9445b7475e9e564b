//! kvdb - an in-memory key/value database with a TCP command protocol and
//! optional write-ahead-log durability.
//!
//! Boot/wiring (C12): init logging, load and validate configuration, build
//! the store/WAL/engine/server in dependency order, restore from the WAL
//! before serving, then run the WAL flush worker and the TCP server under a
//! shared supervisor until cancelled.

use kvdb_core::{replay, CommandEngine, DurableExecutor, Store};
use kvdb_server::{CommandHandler, Config, Server, ServerConfig, Supervisor};
use kvdb_wal::{StdFs, WalLog, WalLogConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_logging(&config.logging);

    tracing::info!(
        address = %config.network.address,
        wal_enabled = config.wal.enabled,
        "starting kvdb"
    );

    let store = Arc::new(Store::new());

    let wal = if config.wal.enabled {
        let session_id = kvdb_wal::now_millis();
        let wal_config = WalLogConfig {
            data_directory: config.wal.data_directory.clone(),
            max_segment_size: config.wal.max_segment_size,
            flushing_batch_size: config.wal.flushing_batch_size,
            flushing_batch_timeout: config.wal.flushing_batch_timeout(),
        };
        Some(Arc::new(WalLog::new(Arc::new(StdFs), session_id, wal_config)?))
    } else {
        None
    };

    let executor = DurableExecutor::new(store.clone(), wal.clone());

    if let Some(wal) = &wal {
        let replayed = wal.restore()?;
        let count = replayed.len();
        replay(&executor, replayed)?;
        tracing::info!(records = count, "restored store from WAL");
    }

    let engine = Arc::new(CommandEngine::new(executor));
    let handler = Arc::new(CommandHandler::new(engine));

    let server_config = ServerConfig {
        address: config.network.address,
        max_connections: config.network.max_connections,
        max_message_size: config.network.max_message_size,
        idle_timeout: config.network.idle_timeout(),
    };
    server_config
        .validate()
        .map_err(|msg| format!("invalid network configuration: {msg}"))?;
    let server = Arc::new(Server::new(server_config, handler));

    let cancel = CancellationToken::new();

    let mut supervisor = Supervisor::new().add({
        let server = server.clone();
        let cancel = cancel.clone();
        async move { server.serve(cancel, || {}).await }
    });

    if let Some(wal) = wal.clone() {
        let cancel = cancel.clone();
        supervisor = supervisor.add(async move { wal.serve(cancel).await.map_err(Into::into) });
    }

    let shutdown_cancel = cancel.clone();
    let shutdown = tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutdown signal received");
        shutdown_cancel.cancel();
    });

    let result = supervisor.run(cancel).await;
    shutdown.abort();

    if let Err(errors) = result {
        for err in &errors {
            tracing::error!(error = %err, "service exited with error");
        }
        return Err(format!("{} service(s) failed", errors.len()).into());
    }

    tracing::info!("kvdb stopped");
    Ok(())
}

/// Waits for SIGINT, and on Unix also SIGTERM.
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Initializes the global subscriber (C14) exactly once, before any other
/// component runs. `logging.output` selects the destination; an
/// `RUST_LOG`-style env var, if set, overrides `logging.level`.
fn init_logging(logging: &kvdb_server::LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    match logging.output.as_str() {
        "stderr" => tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init(),
        "discard" => tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::sink).init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
