mod mining;

pub use mining::{is_solution, MiningError};

use sha2::{Digest, Sha256};

use crate::hash::Hashcode;
use crate::merkle::MerkleTree;
use crate::signing::SigningOracle;
use crate::transaction::Transaction;

/// An immutable unit of the chain: a Merkle tree of transactions, a
/// proof-of-work nonce, and the hash derived from both.
///
/// The link to the predecessor is the predecessor's Merkle root, not its
/// block hash, so a predecessor's id and nonce are not covered by the
/// link. Kept as-is for wire compatibility.
#[derive(Debug, Clone)]
pub struct Block {
    id: u32,
    nonce: u64,
    transactions: Vec<Transaction>,
    tree: MerkleTree<Transaction>,
    previous_root: Option<Hashcode>,
    hash: Hashcode,
}

impl Block {
    /// Mines a new block on top of `previous` (absent for genesis),
    /// searching nonces upward from zero until the difficulty predicate
    /// holds. Blocks the caller until a solution is found.
    pub fn mined(
        transactions: Vec<Transaction>,
        previous: Option<&Block>,
        difficulty: usize,
    ) -> Result<Self, MiningError> {
        let (id, previous_root) = Self::link(previous);
        let tree = MerkleTree::new(transactions.clone());
        let prefix = hash_prefix(previous_root.as_ref(), &tree.merkle_root(), id);

        let mut nonce = 0u64;
        loop {
            let hash = hash_with_nonce(&prefix, nonce);
            if mining::is_solution(&hash, difficulty) {
                return Ok(Self {
                    id,
                    nonce,
                    transactions,
                    tree,
                    previous_root,
                    hash,
                });
            }
            nonce = nonce.checked_add(1).ok_or(MiningError::NonceExhausted)?;
        }
    }

    /// Builds a block with a caller-supplied nonce, recomputing the hash
    /// from the parts. Used when reconstructing a chain from the wire;
    /// there is no guarantee the result is mined.
    pub fn with_nonce(transactions: Vec<Transaction>, previous: Option<&Block>, nonce: u64) -> Self {
        let (id, previous_root) = Self::link(previous);
        let tree = MerkleTree::new(transactions.clone());
        let prefix = hash_prefix(previous_root.as_ref(), &tree.merkle_root(), id);
        let hash = hash_with_nonce(&prefix, nonce);
        Self {
            id,
            nonce,
            transactions,
            tree,
            previous_root,
            hash,
        }
    }

    fn link(previous: Option<&Block>) -> (u32, Option<Hashcode>) {
        match previous {
            Some(previous) => (previous.id + 1, Some(previous.merkle_root())),
            None => (0, None),
        }
    }

    pub fn is_mined(&self, difficulty: usize) -> bool {
        mining::is_solution(&self.hash, difficulty)
    }

    /// True iff every transaction in this block verifies against the
    /// oracle.
    pub fn is_verified(&self, oracle: &dyn SigningOracle) -> bool {
        self.transactions.iter().all(|tx| tx.is_verified(oracle))
    }

    /// Linear scan of this block's own transactions only; predecessors are
    /// not searched.
    pub fn find_transaction(&self, id: u32) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id() == id)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &Hashcode {
        &self.hash
    }

    pub fn merkle_root(&self) -> Hashcode {
        self.tree.merkle_root()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transactions_tree(&self) -> &MerkleTree<Transaction> {
        &self.tree
    }

    /// Merkle root of the predecessor, absent on the genesis block.
    pub fn previous_root(&self) -> Option<&Hashcode> {
        self.previous_root.as_ref()
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.nonce == other.nonce
            && self.transactions == other.transactions
            && self.hash == other.hash
    }
}

impl Eq for Block {}

/// Canonical hash input minus the trailing nonce: the predecessor's Merkle
/// root when there is one, this block's own Merkle root, then the 4-byte
/// big-endian id. The hasher is cloned per nonce so the fixed prefix is
/// absorbed once.
fn hash_prefix(previous_root: Option<&Hashcode>, root: &Hashcode, id: u32) -> Sha256 {
    let mut hasher = Sha256::new();
    if let Some(previous_root) = previous_root {
        hasher.update(previous_root.as_bytes());
    }
    hasher.update(root.as_bytes());
    hasher.update(id.to_be_bytes());
    hasher
}

fn hash_with_nonce(prefix: &Sha256, nonce: u64) -> Hashcode {
    let mut hasher = prefix.clone();
    hasher.update(nonce.to_be_bytes());
    Hashcode::wrap(hasher.finalize().into())
}
