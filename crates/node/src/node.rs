use std::sync::{Arc, Mutex};

use ledger::Blockchain;
use ledger_types::signing::SigningOracle;
use ledger_types::{Block, Transaction};
use store::Store;
use tracing::{info, warn};

use crate::behavior::NodeBehavior;
use crate::buffer::TxBuffer;
use crate::error::NodeError;

/// The honest node: a chain backed by the shared store, a transaction
/// buffer, and the oracle that signs locally created transactions.
///
/// The same store slot is written by the sync side when a friend's chain
/// is adopted; chain reads refresh from it so the in-memory copy follows.
pub struct LedgerNode {
    store: Arc<dyn Store<Blockchain>>,
    oracle: Arc<dyn SigningOracle>,
    difficulty: usize,
    chain: Mutex<Blockchain>,
    buffer: Mutex<TxBuffer>,
}

impl LedgerNode {
    /// Loads the chain from the store (a failed read is logged and
    /// degrades to an empty chain) and points the id cursor just past the
    /// chain's last transaction.
    pub fn new(
        store: Arc<dyn Store<Blockchain>>,
        oracle: Arc<dyn SigningOracle>,
        difficulty: usize,
    ) -> Self {
        let chain = match store.load() {
            Ok(Some(chain)) => chain,
            Ok(None) => Blockchain::new(),
            Err(error) => {
                warn!(%error, "couldn't read the stored blockchain, starting empty");
                Blockchain::new()
            }
        };
        let next_id = chain.last_transaction_id().map_or(0, |id| id + 1);
        info!(
            blocks = chain.len(),
            next_transaction_id = next_id,
            "chain loaded"
        );
        Self {
            store,
            oracle,
            difficulty,
            chain: Mutex::new(chain),
            buffer: Mutex::new(TxBuffer::new(next_id)),
        }
    }

    /// Snapshot of the chain's blocks, tip first. Reads pick up a chain
    /// the sync side adopted since the last call.
    pub fn blocks(&self) -> Vec<Block> {
        self.refresh_chain();
        self.chain
            .lock()
            .expect("chain lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Read-only copy of the unmined transactions.
    pub fn transaction_buffer(&self) -> Vec<Transaction> {
        self.buffer
            .lock()
            .expect("buffer lock poisoned")
            .transactions()
            .to_vec()
    }

    /// Replaces the in-memory chain with the stored one when a copy
    /// exists. A failed read keeps the last good chain.
    fn refresh_chain(&self) {
        match self.store.load() {
            Ok(Some(stored)) => *self.chain.lock().expect("chain lock poisoned") = stored,
            Ok(None) => {}
            Err(error) => warn!(%error, "couldn't refresh the chain from the store"),
        }
    }
}

impl NodeBehavior for LedgerNode {
    fn submit_transaction(&self, payload: &str) -> Result<Transaction, NodeError> {
        let tx = Transaction::signed(payload, self.oracle.as_ref());
        let mut buffer = self.buffer.lock().expect("buffer lock poisoned");
        let tx = buffer.push(tx);
        info!(id = tx.id(), "transaction buffered");
        Ok(tx)
    }

    fn mine(&self) -> Result<bool, NodeError> {
        let mut buffer = self.buffer.lock().expect("buffer lock poisoned");
        if buffer.is_empty() {
            return Ok(false);
        }

        let mut chain = self.chain.lock().expect("chain lock poisoned");
        chain.add(buffer.transactions().to_vec(), self.difficulty)?;
        buffer.flush();
        self.store.save(&chain)?;
        info!(
            blocks = chain.len(),
            tip = %chain.current_block().map(|b| b.hash().to_hex()).unwrap_or_default(),
            "buffer mined into a new block"
        );
        Ok(true)
    }

    fn clear_buffer(&self) -> Result<Vec<Transaction>, NodeError> {
        let mut buffer = self.buffer.lock().expect("buffer lock poisoned");
        buffer.clear();
        Ok(buffer.transactions().to_vec())
    }
}
