//! Error kinds for the command pipeline (C1-C2, C8-C9).
//!
//! `CoreError` carries two categories the transport treats differently: a
//! `BadRequest` wraps a deterministic chain of short contextual messages that
//! becomes the client-visible `Bad request: ...` reply; everything else is an
//! internal failure that becomes the literal `Internal server error` reply.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("unexpected symbol: {0:?}")]
    UnexpectedSymbol(char),
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("empty tokens")]
    EmptyTokens,

    #[error("unknown command")]
    UnknownCommand,

    #[error("not enough arguments")]
    NotEnoughArguments,

    #[error("too many arguments")]
    TooManyArguments,
}

/// A request that failed before it reached the store: parse/analyze failures.
/// `Display` renders the short contextual chain the wire reply is built from,
/// e.g. `parse command: analyze command: unknown command`.
#[derive(Debug, Error)]
pub enum BadRequestError {
    #[error("parse command: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error("parse command: analyze command: {0}")]
    Analyze(#[from] AnalyzeError),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("bad request: {0}")]
    BadRequest(#[from] BadRequestError),

    #[error("handle {op} command: {source}")]
    Wal {
        op: crate::command::CommandId,
        #[source]
        source: kvdb_wal::WalError,
    },

    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
}

impl CoreError {
    /// The client-visible wire string for a `BadRequest`, matching the
    /// network-service boundary: `Bad request: ` + the underlying chain, not
    /// `BadRequestError`'s own lowercase `Display`.
    pub fn bad_request_wire_message(&self) -> Option<String> {
        match self {
            CoreError::BadRequest(inner) => Some(format!("Bad request: {inner}")),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Wal { source, .. } if source.is_retryable())
    }
}
