//! Monotone per-process seq-id generator (C7): lock-free, starts at 0, first
//! returned value is 1.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Sequencer {
    current: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically increments the counter and returns the post-increment value.
    pub fn next_seq_id(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }
}
