//! `WalLog`: the buffered group-commit gateway in front of `WalWriter`.
//!
//! Concurrent callers `Add` a command each; the gateway batches pending records
//! under one lock, hands a batch to a single dedicated flush worker when the
//! batch is full or a timer fires, and wakes each caller once the whole batch
//! has been fsynced (or failed) together.

use crate::error::WalError;
use crate::fs::SegmentFs;
use crate::reader::WalReader;
use crate::record::{CommandId, LogRecord, Lsn};
use crate::writer::WalWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

/// A replayed command, reconstructed from the log at boot with its original
/// `seq_id` but no re-assigned durability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedCommand {
    pub seq_id: u64,
    pub op: CommandId,
    pub args: Vec<String>,
}

struct LogTask {
    record: LogRecord,
    done: oneshot::Sender<Result<(), WalError>>,
}

struct Inner {
    writer: Mutex<WalWriter>,
    reader: WalReader,
    directory: PathBuf,
    session_id: u64,
    flushing_batch_size: usize,
    flushing_batch_timeout: std::time::Duration,
    buffer: Mutex<Vec<LogTask>>,
    handoff: mpsc::UnboundedSender<Vec<LogTask>>,
}

/// Configuration for a `WalLog`.
#[derive(Debug, Clone)]
pub struct WalLogConfig {
    pub data_directory: PathBuf,
    pub max_segment_size: u64,
    pub flushing_batch_size: usize,
    pub flushing_batch_timeout: std::time::Duration,
}

/// Errors a `WalLog` can fail construction with.
#[derive(Debug, thiserror::Error)]
pub enum WalLogConfigError {
    #[error("wal.flushing_batch_size must be >= 1")]
    BatchSizeTooSmall,
    #[error("wal.flushing_batch_timeout must be >= 1ms")]
    TimeoutTooSmall,
}

pub struct WalLog {
    inner: Arc<Inner>,
    handoff_rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<LogTask>>>>,
}

impl WalLog {
    /// Builds a new gateway. `session_id` should be the Unix-millisecond
    /// timestamp the owning process started at.
    pub fn new(
        fs: Arc<dyn SegmentFs>,
        session_id: u64,
        config: WalLogConfig,
    ) -> Result<Self, WalLogConfigError> {
        if config.flushing_batch_size == 0 {
            return Err(WalLogConfigError::BatchSizeTooSmall);
        }
        if config.flushing_batch_timeout.is_zero() {
            return Err(WalLogConfigError::TimeoutTooSmall);
        }

        let writer = WalWriter::new(
            fs.clone(),
            config.data_directory.clone(),
            session_id,
            config.max_segment_size,
        );
        let reader = WalReader::new(fs);
        let (handoff_tx, handoff_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            writer: Mutex::new(writer),
            reader,
            directory: config.data_directory,
            session_id,
            flushing_batch_size: config.flushing_batch_size,
            flushing_batch_timeout: config.flushing_batch_timeout,
            buffer: Mutex::new(Vec::new()),
            handoff: handoff_tx,
        });

        Ok(Self {
            inner,
            handoff_rx: Mutex::new(Some(handoff_rx)),
        })
    }

    /// Appends `op`/`args` under `seq_id`, returning once the record (and every
    /// other record in the batch it lands in) has been durably fsynced.
    pub async fn add(&self, seq_id: u64, op: CommandId, args: Vec<String>) -> Result<(), WalError> {
        let record = LogRecord::new(Lsn::new(self.inner.session_id, seq_id), op, args);
        let (done_tx, done_rx) = oneshot::channel();
        let task = LogTask {
            record,
            done: done_tx,
        };

        let should_arm_timer = {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.push(task);
            if buffer.len() >= self.inner.flushing_batch_size {
                let batch = std::mem::take(&mut *buffer);
                let _ = self.inner.handoff.send(batch);
                false
            } else {
                buffer.len() == 1
            }
        };

        if should_arm_timer {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                tokio::time::sleep(inner.flushing_batch_timeout).await;
                let mut buffer = inner.buffer.lock().await;
                if !buffer.is_empty() {
                    let batch = std::mem::take(&mut *buffer);
                    let _ = inner.handoff.send(batch);
                }
            });
        }

        done_rx
            .await
            .unwrap_or(Err(WalError::Closed))
    }

    /// Runs the single dedicated flush worker until `cancel` fires and every
    /// queued batch has drained. Returns only after the worker has exited.
    pub async fn serve(&self, cancel: CancellationToken) -> Result<(), WalError> {
        let mut rx = self
            .handoff_rx
            .lock()
            .await
            .take()
            .expect("serve() called more than once");

        loop {
            tokio::select! {
                biased;
                batch = rx.recv() => {
                    match batch {
                        Some(batch) => self.flush_batch(batch).await,
                        None => break,
                    }
                }
                _ = cancel.cancelled() => {
                    rx.close();
                    while let Ok(batch) = rx.try_recv() {
                        self.flush_batch(batch).await;
                    }
                    break;
                }
            }
        }
        Ok(())
    }

    async fn flush_batch(&self, batch: Vec<LogTask>) {
        let records: Vec<LogRecord> = batch.iter().map(|t| t.record.clone()).collect();
        let result = {
            let mut writer = self.inner.writer.lock().await;
            writer.write_records(&records)
        };
        for task in batch {
            let outcome = match &result {
                Ok(()) => Ok(()),
                Err(e) => Err(clone_wal_error(e)),
            };
            let _ = task.done.send(outcome);
        }
    }

    /// Reads the WAL and converts every record back into a command, in LSN
    /// order, for replay into the store. Must be called before `serve` begins
    /// accepting new writes.
    pub fn restore(&self) -> Result<Vec<ReplayedCommand>, WalError> {
        let records = self.inner.reader.read_records(&self.inner.directory)?;
        Ok(records
            .into_iter()
            .map(|r| ReplayedCommand {
                seq_id: r.lsn.seq_id,
                op: r.op,
                args: r.args,
            })
            .collect())
    }
}

fn clone_wal_error(e: &WalError) -> WalError {
    WalError::InvalidState(e.to_string())
}
