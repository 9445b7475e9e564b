//! The durable executor (C8): decides whether a command needs to go through
//! the WAL before touching the store, and maps store results to wire replies.

use crate::command::Command;
use crate::error::CoreError;
use crate::store::Store;
use kvdb_wal::WalLog;
use std::sync::Arc;

/// The literal reply for a `GET` miss, propagated verbatim by the transport.
pub const NOT_FOUND_REPLY: &str = "$_";

pub struct DurableExecutor {
    store: Arc<Store>,
    wal: Option<Arc<WalLog>>,
}

impl DurableExecutor {
    pub fn new(store: Arc<Store>, wal: Option<Arc<WalLog>>) -> Self {
        Self { store, wal }
    }

    /// Executes `command`, returning the client-visible reply string.
    ///
    /// Reads always bypass the WAL. Writes are logged first; the store is only
    /// mutated once the WAL confirms the record is fsynced, and a WAL failure
    /// is returned without touching the store.
    pub async fn execute(&self, command: Command) -> Result<String, CoreError> {
        if command.is_write() {
            if let Some(wal) = &self.wal {
                wal.add(command.seq_id(), command.id(), command.args())
                    .await
                    .map_err(|source| CoreError::Wal { op: command.id(), source })?;
            }
        }
        self.dispatch(command)
    }

    /// Applies `command` to the store directly, with no WAL interaction at
    /// all. Used both for the non-durable read path and for replaying commands
    /// recovered from the log at boot (which were already durable when first
    /// written).
    pub fn dispatch(&self, command: Command) -> Result<String, CoreError> {
        match command {
            Command::Get { key, .. } => Ok(self.store.get(&key).unwrap_or_else(|| NOT_FOUND_REPLY.to_string())),
            Command::Set { key, value, .. } => {
                self.store.set(key, value);
                Ok("OK".to_string())
            }
            Command::Del { key, .. } => {
                self.store.del(&key);
                Ok("OK".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_bypasses_the_wal_entirely() {
        let store = Arc::new(Store::new());
        store.set("k".into(), "v".into());
        let executor = DurableExecutor::new(store, None);
        let reply = executor
            .execute(Command::Get { seq_id: 1, key: "k".into() })
            .await
            .unwrap();
        assert_eq!(reply, "v");
    }

    #[tokio::test]
    async fn get_miss_returns_sentinel() {
        let store = Arc::new(Store::new());
        let executor = DurableExecutor::new(store, None);
        let reply = executor
            .execute(Command::Get { seq_id: 1, key: "missing".into() })
            .await
            .unwrap();
        assert_eq!(reply, NOT_FOUND_REPLY);
    }

    #[tokio::test]
    async fn set_and_del_reply_ok_when_wal_disabled() {
        let store = Arc::new(Store::new());
        let executor = DurableExecutor::new(store.clone(), None);
        let set_reply = executor
            .execute(Command::Set { seq_id: 1, key: "k".into(), value: "v".into() })
            .await
            .unwrap();
        assert_eq!(set_reply, "OK");
        assert_eq!(store.get("k"), Some("v".into()));

        let del_reply = executor
            .execute(Command::Del { seq_id: 2, key: "k".into() })
            .await
            .unwrap();
        assert_eq!(del_reply, "OK");
        assert_eq!(store.get("k"), None);
    }
}
