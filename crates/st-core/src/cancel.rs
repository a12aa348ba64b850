//! Cooperative cancellation for long offline renders
//!
//! Checked at stem/channel granularity: a cancelled unit discards its
//! partial buffer instead of publishing it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag shared between a pipeline and its workers
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; workers observe it at their next checkpoint
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Re-arm the token for a new run
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
