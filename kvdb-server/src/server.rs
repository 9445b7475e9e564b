//! TCP server (C10): a bounded-concurrency accept loop over a per-connection
//! request/response worker.

use crate::error::ServerError;
use crate::handler::CommandHandler;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub max_connections: usize,
    pub max_message_size: usize,
    pub idle_timeout: Duration,
}

impl ServerConfig {
    /// All four parameters must be strictly positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        if self.max_message_size == 0 {
            return Err("max_message_size must be > 0".to_string());
        }
        if self.idle_timeout.is_zero() {
            return Err("idle_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub requests_total: AtomicU64,
    pub errors_total: AtomicU64,
}

pub struct Server {
    config: ServerConfig,
    handler: Arc<CommandHandler>,
    stats: Arc<ServerStats>,
}

impl Server {
    pub fn new(config: ServerConfig, handler: Arc<CommandHandler>) -> Self {
        Self { config, handler, stats: Arc::new(ServerStats::default()) }
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Runs the accept loop until `cancel` fires, then waits for every
    /// in-flight connection worker to finish before returning.
    pub async fn serve(&self, cancel: CancellationToken, on_start: impl FnOnce()) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.address).await?;
        on_start();
        tracing::info!(address = %self.config.address, "listening");

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let mut workers = tokio::task::JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("server shutting down");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                            self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
                            self.stats.connections_active.fetch_add(1, Ordering::Relaxed);

                            let handler = self.handler.clone();
                            let stats = self.stats.clone();
                            let config = self.config.clone();
                            let worker_cancel = cancel.clone();

                            workers.spawn(async move {
                                let _permit = permit;
                                if let Err(e) = handle_connection(stream, addr, handler, &config, worker_cancel).await {
                                    tracing::debug!(%addr, error = %e, "connection closed with error");
                                    stats.errors_total.fetch_add(1, Ordering::Relaxed);
                                }
                                stats.connections_active.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "transient accept error");
                        }
                    }
                }
            }
        }

        while workers.join_next().await.is_some() {}
        Ok(())
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    handler: Arc<CommandHandler>,
    config: &ServerConfig,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    tracing::debug!(%addr, "client connected");
    let mut buf = vec![0u8; config.max_message_size];

    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            result = tokio::time::timeout(config.idle_timeout, stream.read(&mut buf)) => result,
        };

        let n = match read {
            Ok(Ok(0)) => {
                tracing::debug!(%addr, "connection closed by client");
                return Ok(());
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(ServerError::Io(e)),
            Err(_) => {
                tracing::debug!(%addr, "idle timeout");
                return Ok(());
            }
        };

        let request = String::from_utf8_lossy(&buf[..n]);
        let reply = handler.handle(request.trim_end()).await;

        stream.write_all(reply.as_bytes()).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_connections() {
        let config = ServerConfig {
            address: "127.0.0.1:0".parse().unwrap(),
            max_connections: 0,
            max_message_size: 8192,
            idle_timeout: Duration::from_secs(1),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_idle_timeout() {
        let config = ServerConfig {
            address: "127.0.0.1:0".parse().unwrap(),
            max_connections: 1,
            max_message_size: 8192,
            idle_timeout: Duration::ZERO,
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn serves_one_round_trip_then_shuts_down_on_cancel() {
        use kvdb_core::{CommandEngine, DurableExecutor, Store};
        use tokio::net::TcpStream as ClientStream;

        let store = Arc::new(Store::new());
        let executor = DurableExecutor::new(store, None);
        let engine = Arc::new(CommandEngine::new(executor));
        let handler = Arc::new(CommandHandler::new(engine));

        let config = ServerConfig {
            address: "127.0.0.1:0".parse().unwrap(),
            max_connections: 4,
            max_message_size: 1024,
            idle_timeout: Duration::from_secs(5),
        };
        let listener = TcpListener::bind(config.address).await.unwrap();
        let bound_addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ServerConfig { address: bound_addr, ..config };
        let server = Server::new(config, handler);
        let cancel = CancellationToken::new();
        let server_cancel = cancel.clone();

        let serve_handle = tokio::spawn(async move { server.serve(server_cancel, || {}).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut client = ClientStream::connect(bound_addr).await.unwrap();
        client.write_all(b"SET k v\n").await.unwrap();
        let mut out = [0u8; 64];
        let n = client.read(&mut out).await.unwrap();
        assert_eq!(&out[..n], b"OK");

        cancel.cancel();
        serve_handle.await.unwrap().unwrap();
    }
}
