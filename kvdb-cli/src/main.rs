//! kvdb-cli - Command-line client for kvdb
//!
//! Provides both a REPL and one-shot subcommands over `kvdb-client`.

mod commands;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kvdb-cli")]
#[command(about = "Command-line client for kvdb")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7401")]
    server: SocketAddr,

    /// Logging verbosity (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive REPL
    Repl,

    /// Check the connection is alive
    Ping,

    /// Fetch the value stored for a key
    Get {
        /// Key to look up
        key: String,
    },

    /// Set a key to a value
    Set {
        /// Key to set
        key: String,
        /// Value to store
        value: String,
    },

    /// Delete a key
    Del {
        /// Key to delete
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    let client = kvdb_client::Client::connect(cli.server).await.map_err(|e| {
        eprintln!("{}: {e}", "Connection failed".red());
        e
    })?;

    match cli.command {
        Some(Commands::Repl) | None => {
            repl::run(client, cli.server).await?;
        }
        Some(cmd) => match commands::execute(&client, cmd).await {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("{}: {e}", "Error".red());
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
