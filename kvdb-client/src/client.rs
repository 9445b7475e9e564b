//! Minimal asynchronous client (C15): one request in flight per connection,
//! matching the server's single-request-per-read contract. Not durable, not
//! pooled, not retrying.

use crate::error::ClientError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

const NOT_FOUND_REPLY: &str = "$_";
const INTERNAL_SERVER_ERROR: &str = "Internal server error";
const READ_BUF_SIZE: usize = 8192;

pub struct Client {
    stream: Mutex<TcpStream>,
}

impl Client {
    /// Connects to `address` and returns a client ready to send commands.
    pub async fn connect(address: impl tokio::net::ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self { stream: Mutex::new(stream) })
    }

    /// Sends `command` verbatim and returns the raw reply string.
    pub async fn send(&self, command: &str) -> Result<String, ClientError> {
        let mut stream = self.stream.lock().await;

        stream.write_all(command.as_bytes()).await?;

        let mut buf = vec![0u8; READ_BUF_SIZE];
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }

        Ok(String::from_utf8_lossy(&buf[..n]).to_string())
    }

    fn reply_to_result(reply: String) -> Result<String, ClientError> {
        if let Some(chain) = reply.strip_prefix("Bad request: ") {
            return Err(ClientError::BadRequest(chain.to_string()));
        }
        if reply == INTERNAL_SERVER_ERROR {
            return Err(ClientError::ServerInternal);
        }
        Ok(reply)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let reply = Self::reply_to_result(self.send(&format!("GET {key}")).await?)?;
        if reply == NOT_FOUND_REPLY {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        Self::reply_to_result(self.send(&format!("SET {key} {value}")).await?)?;
        Ok(())
    }

    pub async fn del(&self, key: &str) -> Result<(), ClientError> {
        Self::reply_to_result(self.send(&format!("DEL {key}")).await?)?;
        Ok(())
    }

    /// Reports whether the underlying connection is still open. There is no
    /// `PING` wire command, the grammar only defines `GET`/`SET`/`DEL`, so
    /// this checks the socket directly rather than round-tripping a request.
    pub async fn ping(&self) -> bool {
        self.stream.lock().await.peer_addr().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvdb_core::{CommandEngine, DurableExecutor, Store};
    use kvdb_server::{CommandHandler, Server, ServerConfig};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn spawn_server() -> (std::net::SocketAddr, CancellationToken, tokio::task::JoinHandle<()>) {
        let store = Arc::new(Store::new());
        let executor = DurableExecutor::new(store, None);
        let engine = Arc::new(CommandEngine::new(executor));
        let handler = Arc::new(CommandHandler::new(engine));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let config = ServerConfig {
            address,
            max_connections: 4,
            max_message_size: 4096,
            idle_timeout: Duration::from_secs(5),
        };
        let server = Server::new(config, handler);
        let cancel = CancellationToken::new();
        let serve_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            server.serve(serve_cancel, || {}).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        (address, cancel, handle)
    }

    #[tokio::test]
    async fn set_get_del_round_trip() {
        let (address, cancel, handle) = spawn_server().await;
        let client = Client::connect(address).await.unwrap();

        client.set("k", "v").await.unwrap();
        assert_eq!(client.get("k").await.unwrap(), Some("v".to_string()));
        client.del("k").await.unwrap();
        assert_eq!(client.get("k").await.unwrap(), None);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn bad_request_surfaces_as_typed_error() {
        let (address, cancel, handle) = spawn_server().await;
        let client = Client::connect(address).await.unwrap();

        let err = client.send("NOPE k").await.unwrap();
        let result = Client::reply_to_result(err);
        assert!(matches!(result, Err(ClientError::BadRequest(_))));

        cancel.cancel();
        handle.await.unwrap();
    }
}
