//! One-shot subcommand execution.

use crate::Commands;
use colored::Colorize;
use kvdb_client::{Client, ClientError};

/// Executes a single one-shot command and returns the formatted output.
pub async fn execute(client: &Client, cmd: Commands) -> Result<String, ClientError> {
    match cmd {
        Commands::Repl => unreachable!("REPL is handled before dispatching to execute()"),

        Commands::Ping => {
            if client.ping().await {
                Ok("PONG".green().to_string())
            } else {
                Err(ClientError::ConnectionClosed)
            }
        }

        Commands::Get { key } => match client.get(&key).await? {
            Some(value) => Ok(value),
            None => Ok("$_".dimmed().to_string()),
        },

        Commands::Set { key, value } => {
            client.set(&key, &value).await?;
            Ok("OK".green().to_string())
        }

        Commands::Del { key } => {
            client.del(&key).await?;
            Ok("OK".green().to_string())
        }
    }
}
