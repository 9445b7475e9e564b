//! Translates raw request bytes into a reply by calling the command engine
//! and mapping its errors onto the exact wire strings §6 specifies.

use kvdb_core::CommandEngine;
use std::sync::Arc;

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

pub struct CommandHandler {
    engine: Arc<CommandEngine>,
}

impl CommandHandler {
    pub fn new(engine: Arc<CommandEngine>) -> Self {
        Self { engine }
    }

    /// Handles one request, always returning a reply string. A handler never
    /// fails the connection, it only ever produces a wire-visible reply.
    pub async fn handle(&self, request: &str) -> String {
        match self.engine.handle(request).await {
            Ok(reply) => reply,
            Err(err) => err
                .bad_request_wire_message()
                .unwrap_or_else(|| INTERNAL_SERVER_ERROR.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvdb_core::{DurableExecutor, Store};

    fn handler() -> CommandHandler {
        let store = Arc::new(Store::new());
        let executor = DurableExecutor::new(store, None);
        CommandHandler::new(Arc::new(CommandEngine::new(executor)))
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let handler = handler();
        assert_eq!(handler.handle("SET k v").await, "OK");
        assert_eq!(handler.handle("GET k").await, "v");
    }

    #[tokio::test]
    async fn bad_request_is_reported_verbatim() {
        let handler = handler();
        assert_eq!(
            handler.handle("NOPE k").await,
            "Bad request: parse command: analyze command: unknown command"
        );
    }

    #[tokio::test]
    async fn get_miss_reports_sentinel() {
        let handler = handler();
        assert_eq!(handler.handle("GET missing").await, "$_");
    }
}
