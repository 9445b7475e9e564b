//! # kvdb-core
//!
//! The command pipeline for kvdb: tokenizing, analyzing, sequencing, and
//! dispatching commands against the in-memory store, durably via the WAL
//! when one is configured.

pub mod analyzer;
pub mod command;
pub mod engine;
pub mod error;
pub mod executor;
pub mod sequencer;
pub mod store;
pub mod tokenizer;

pub use command::{Command, CommandId};
pub use engine::{replay, CommandEngine, SharedCommandEngine};
pub use error::{AnalyzeError, BadRequestError, CoreError, TokenizeError};
pub use executor::{DurableExecutor, NOT_FOUND_REPLY};
pub use sequencer::Sequencer;
pub use store::Store;
