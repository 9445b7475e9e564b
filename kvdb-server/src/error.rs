//! Server error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] kvdb_core::CoreError),

    #[error("WAL error: {0}")]
    Wal(#[from] kvdb_wal::WalError),

    #[error("{0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("server shutting down")]
    ShuttingDown,

    #[error("no services configured")]
    NoServices,
}

impl ServerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ServerError::Wal(e) => e.is_retryable(),
            _ => false,
        }
    }
}
