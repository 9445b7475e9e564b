//! # kvdb-server
//!
//! TCP transport for kvdb: configuration loading, the bounded-concurrency
//! connection server, the request handler wired to the command engine, and
//! the supervisor that ties the server and the WAL flush worker together.

pub mod config;
pub mod error;
pub mod handler;
pub mod server;
pub mod supervisor;

pub use config::{Config, EngineConfig, LoggingConfig, NetworkConfig, WalSectionConfig};
pub use error::ServerError;
pub use handler::CommandHandler;
pub use server::{Server, ServerConfig};
pub use supervisor::Supervisor;
