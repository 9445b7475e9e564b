//! The command domain type: a tagged variant rather than an op tag plus a
//! loosely-typed argument list, per the "command as tagged variant" design
//! note, this removes the arity-check-then-index-into-args pattern from
//! every consumer downstream of the analyzer.

pub use kvdb_wal::CommandId;

/// A fully parsed command, with its sequence id assigned once dispatch begins.
/// `seq_id` is `0` for a command reconstructed from the log prior to
/// sequencing (see `kvdb_wal::ReplayedCommand`, which carries the original
/// seq_id separately and is converted via `Command::replayed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { seq_id: u64, key: String },
    Set { seq_id: u64, key: String, value: String },
    Del { seq_id: u64, key: String },
}

impl Command {
    pub fn id(&self) -> CommandId {
        match self {
            Command::Get { .. } => CommandId::Get,
            Command::Set { .. } => CommandId::Set,
            Command::Del { .. } => CommandId::Del,
        }
    }

    pub fn seq_id(&self) -> u64 {
        match self {
            Command::Get { seq_id, .. }
            | Command::Set { seq_id, .. }
            | Command::Del { seq_id, .. } => *seq_id,
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Command::Get { key, .. } | Command::Del { key, .. } => vec![key.clone()],
            Command::Set { key, value, .. } => vec![key.clone(), value.clone()],
        }
    }

    pub fn is_write(&self) -> bool {
        self.id().is_write()
    }

    /// Assigns `seq_id` to a command produced by the analyzer (which always
    /// leaves it at 0, unassigned).
    pub fn with_seq_id(self, seq_id: u64) -> Self {
        match self {
            Command::Get { key, .. } => Command::Get { seq_id, key },
            Command::Set { key, value, .. } => Command::Set { seq_id, key, value },
            Command::Del { key, .. } => Command::Del { seq_id, key },
        }
    }

    /// Reconstructs a command from a replayed WAL record.
    pub fn from_replayed(replayed: kvdb_wal::ReplayedCommand) -> Option<Self> {
        let kvdb_wal::ReplayedCommand { seq_id, op, mut args } = replayed;
        match op {
            CommandId::Get if args.len() == 1 => Some(Command::Get {
                seq_id,
                key: args.remove(0),
            }),
            CommandId::Set if args.len() == 2 => {
                let value = args.remove(1);
                let key = args.remove(0);
                Some(Command::Set { seq_id, key, value })
            }
            CommandId::Del if args.len() == 1 => Some(Command::Del {
                seq_id,
                key: args.remove(0),
            }),
            _ => None,
        }
    }
}
