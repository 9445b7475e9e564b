//! # kvdb-client
//!
//! Minimal asynchronous client for kvdb's wire protocol (C15): connect, send
//! one command, read one reply, repeat. Not durable, not pooled, not
//! retrying: a thin transport wrapper for the CLI and for integration tests.

pub mod client;
pub mod error;

pub use client::Client;
pub use error::ClientError;
