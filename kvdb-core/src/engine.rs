//! The command engine (C9): ties tokenizing, analyzing, sequencing, and
//! execution into the single entry point the transport calls per request.

use crate::analyzer::analyze;
use crate::error::{BadRequestError, CoreError};
use crate::executor::DurableExecutor;
use crate::sequencer::Sequencer;
use crate::tokenizer::tokenize;
use std::sync::Arc;

pub struct CommandEngine {
    sequencer: Sequencer,
    executor: DurableExecutor,
}

impl CommandEngine {
    pub fn new(executor: DurableExecutor) -> Self {
        Self { sequencer: Sequencer::new(), executor }
    }

    /// Parses `raw`, assigns it a sequence id, and executes it, returning the
    /// client-visible reply. Tokenize/analyze failures are wrapped in
    /// `CoreError::BadRequest` rather than propagated raw, so the transport
    /// can tell a malformed request from an internal failure.
    pub async fn handle(&self, raw: &str) -> Result<String, CoreError> {
        let tokens = tokenize(raw).map_err(BadRequestError::from)?;
        let command = analyze(&tokens).map_err(BadRequestError::from)?;
        let command = command.with_seq_id(self.sequencer.next_seq_id());
        self.executor.execute(command).await
    }
}

/// Replays every command recovered from the log into the store, in the order
/// `WalLog::restore` returned them, bypassing the WAL and the sequencer
/// entirely since these commands were already durable and already sequenced.
pub fn replay(executor: &DurableExecutor, replayed: Vec<kvdb_wal::ReplayedCommand>) -> Result<(), CoreError> {
    for record in replayed {
        if let Some(command) = crate::command::Command::from_replayed(record) {
            executor.dispatch(command)?;
        }
    }
    Ok(())
}

pub type SharedCommandEngine = Arc<CommandEngine>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn engine() -> CommandEngine {
        let store = Arc::new(Store::new());
        let executor = DurableExecutor::new(store, None);
        CommandEngine::new(executor)
    }

    #[tokio::test]
    async fn set_then_get_round_trips_through_the_engine() {
        let engine = engine();
        assert_eq!(engine.handle("SET k v").await.unwrap(), "OK");
        assert_eq!(engine.handle("GET k").await.unwrap(), "v");
    }

    #[tokio::test]
    async fn malformed_request_is_a_bad_request() {
        let engine = engine();
        let err = engine.handle("NOPE k").await.unwrap_err();
        assert_eq!(
            err.bad_request_wire_message().unwrap(),
            "Bad request: parse command: analyze command: unknown command"
        );
    }

    #[tokio::test]
    async fn each_command_gets_a_fresh_increasing_seq_id() {
        let engine = engine();
        engine.handle("SET a 1").await.unwrap();
        engine.handle("SET b 2").await.unwrap();
        assert_eq!(engine.sequencer.next_seq_id(), 3);
    }
}
