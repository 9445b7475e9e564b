//! # kvdb-wal
//!
//! Write-ahead log for kvdb: a durable, append-only, segmented log with
//! per-record checksums and a buffered group-commit gateway in front of it.

pub mod error;
pub mod fs;
pub mod log;
pub mod reader;
pub mod record;
pub mod segment;
pub mod writer;

pub use error::WalError;
pub use fs::{AppendFile, MemFs, SegmentFs, StdFs};
pub use log::{ReplayedCommand, WalLog, WalLogConfig, WalLogConfigError};
pub use reader::WalReader;
pub use record::{CommandId, Lsn, LogRecord};
pub use writer::WalWriter;

/// Default segment size (64 MiB), used when no explicit limit is configured.
pub const DEFAULT_SEGMENT_SIZE: u64 = 64 * 1024 * 1024;

/// WAL record header size in bytes: magic(4) + op(1) + flags(1) + reserved(2) +
/// payload_len(4) + crc32c(4) + seq_id(8).
pub const RECORD_HEADER_SIZE: usize = 24;

/// Returns the current Unix-millisecond timestamp, used to derive a fresh
/// session_id at process start.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
