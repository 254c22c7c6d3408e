use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ledger_types::Transaction;
use tracing::debug;

use crate::error::NodeError;

/// The three node operations a variant may override. The sync protocol and
/// the data model sit underneath and are never forked; a variant only
/// changes how these entry points answer.
pub trait NodeBehavior: Send + Sync {
    /// Signs a transaction for the payload and buffers it.
    fn submit_transaction(&self, payload: &str) -> Result<Transaction, NodeError>;

    /// Flushes the buffer into a newly mined block and persists the
    /// chain. `Ok(false)` means there was nothing to mine.
    fn mine(&self) -> Result<bool, NodeError>;

    /// Empties the buffer, returning its contents after the clear.
    fn clear_buffer(&self) -> Result<Vec<Transaction>, NodeError>;
}

/// Adversarial variant: refuses all three operations while a background
/// thread keeps fabricating transactions it immediately throws away,
/// burning cycles without ever committing state.
pub struct SybilBehavior {
    stop: Arc<AtomicBool>,
}

impl SybilBehavior {
    pub fn new() -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        thread::spawn(move || {
            let mut counter: u64 = 0;
            while !flag.load(Ordering::Relaxed) {
                let tx = Transaction::from_parts(counter.to_string(), "fake", "transaction");
                drop(tx);
                counter = counter.wrapping_add(1);
            }
            debug!(fabricated = counter, "sybil load loop stopped");
        });
        Self { stop }
    }
}

impl Default for SybilBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SybilBehavior {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl NodeBehavior for SybilBehavior {
    /// Every submission reports a malformed body.
    fn submit_transaction(&self, _payload: &str) -> Result<Transaction, NodeError> {
        Err(NodeError::MalformedTransaction {
            reason: "request body did not contain a payload".into(),
        })
    }

    /// Pretends there is never anything to mine.
    fn mine(&self) -> Result<bool, NodeError> {
        Ok(false)
    }

    /// Pretends the buffer was already empty.
    fn clear_buffer(&self) -> Result<Vec<Transaction>, NodeError> {
        Ok(Vec::new())
    }
}
