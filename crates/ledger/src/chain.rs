use ledger_types::signing::SigningOracle;
use ledger_types::{Block, MiningError, Transaction};

/// The backward-linked sequence of mined blocks.
///
/// Blocks live in an arena ordered genesis to tip; a block's predecessor
/// is simply the previous entry and the tip is the last one, so block ids
/// increase by exactly one from genesis and transaction ids increase
/// strictly across the whole chain, never reused and never reset at block
/// boundaries. The chain only ever grows through [`Blockchain::add`];
/// adopting a peer's chain is a wholesale replacement of the value, never
/// a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// The most recently appended block, absent when the chain is empty.
    pub fn current_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Assigns fresh ids to `transactions`, picking up where the chain's
    /// last transaction left off, then mines them into a new block on the
    /// tip. Blocks the caller until mining succeeds.
    pub fn add(
        &mut self,
        mut transactions: Vec<Transaction>,
        difficulty: usize,
    ) -> Result<(), MiningError> {
        let mut next_id = self.last_transaction_id().map_or(0, |id| id + 1);
        for tx in &mut transactions {
            tx.set_id(next_id);
            next_id += 1;
        }
        let block = Block::mined(transactions, self.blocks.last(), difficulty)?;
        self.blocks.push(block);
        Ok(())
    }

    /// True when every block is mined; vacuously true for an empty chain.
    pub fn is_mined(&self, difficulty: usize) -> bool {
        self.iter().all(|block| block.is_mined(difficulty))
    }

    /// True when every transaction in every block verifies; vacuously true
    /// for an empty chain.
    pub fn is_verified(&self, oracle: &dyn SigningOracle) -> bool {
        self.iter().all(|block| block.is_verified(oracle))
    }

    /// Id of the last transaction in the tip block, absent when the chain
    /// is empty.
    pub fn last_transaction_id(&self) -> Option<u32> {
        self.current_block()
            .and_then(|block| block.transactions().last())
            .map(Transaction::id)
    }

    /// Walks tip toward genesis; the first matching transaction wins.
    pub fn find_transaction(&self, id: u32) -> Option<&Transaction> {
        self.iter().find_map(|block| block.find_transaction(id))
    }

    /// Looks for the transaction only inside the block with `block_id`.
    pub fn find_transaction_in_block(
        &self,
        transaction_id: u32,
        block_id: u32,
    ) -> Option<&Transaction> {
        self.iter()
            .find(|block| block.id() == block_id)
            .and_then(|block| block.find_transaction(transaction_id))
    }

    /// Blocks in reverse chronological order, tip first. Callers must not
    /// assume genesis-first order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Genesis-first view for the wire codec.
    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use ledger_types::consts::DIFFICULTY;
    use ledger_types::signing::Ed25519Oracle;

    use super::*;

    fn single_transaction() -> Vec<Transaction> {
        vec![Transaction::from_parts("Hello", "World", "")]
    }

    fn three_transactions() -> Vec<Transaction> {
        vec![
            Transaction::from_parts("Hello", "World", ""),
            Transaction::from_parts("Hi", "Universe", ""),
            Transaction::from_parts("Howdy", "Space", ""),
        ]
    }

    #[test]
    fn empty_chain_is_vacuously_fine() {
        let chain = Blockchain::new();
        let oracle = Ed25519Oracle::new();

        assert!(chain.current_block().is_none());
        assert!(chain.is_mined(DIFFICULTY));
        assert!(chain.is_verified(&oracle));
        assert!(chain.last_transaction_id().is_none());
        assert!(chain.is_empty());
    }

    #[test]
    fn genesis_block_reproduces_the_expected_hash() {
        let mut chain = Blockchain::new();
        chain.add(single_transaction(), DIFFICULTY).unwrap();

        let tip = chain.current_block().unwrap();
        assert_eq!(
            tip.hash().to_hex(),
            "000c82d62127b10120494a4eb38908b4abfa819e8071f4e7e5a346f525d2cddb"
        );
        assert_eq!(tip.id(), 0);
        assert!(tip.previous_root().is_none());
        assert_eq!(chain.last_transaction_id(), Some(0));
        assert!(chain.is_mined(DIFFICULTY));
    }

    #[test]
    fn second_block_continues_ids_and_reproduces_the_expected_hash() {
        let mut chain = Blockchain::new();
        chain.add(single_transaction(), DIFFICULTY).unwrap();
        chain.add(three_transactions(), DIFFICULTY).unwrap();

        let tip = chain.current_block().unwrap();
        assert_eq!(
            tip.hash().to_hex(),
            "000be659874ac33e21aff7b5126907860447f177321f7a289fc0972ae5a7cd3a"
        );
        assert_eq!(chain.last_transaction_id(), Some(3));
        assert_eq!(chain.len(), 2);
        assert!(chain.is_mined(DIFFICULTY));
    }

    #[test]
    fn transaction_ids_increase_across_block_boundaries() {
        let mut chain = Blockchain::new();
        chain.add(single_transaction(), 1).unwrap();
        chain.add(single_transaction(), 1).unwrap();

        let first = chain.last_transaction_id().unwrap();
        chain.add(single_transaction(), 1).unwrap();
        let second = chain.last_transaction_id().unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let ids: Vec<u32> = chain
            .blocks()
            .iter()
            .flat_map(|block| block.transactions().iter().map(Transaction::id))
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn block_ids_increase_by_one_from_genesis() {
        let mut chain = Blockchain::new();
        for _ in 0..3 {
            chain.add(single_transaction(), 1).unwrap();
        }
        let ids: Vec<u32> = chain.blocks().iter().map(Block::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn iter_walks_tip_to_genesis() {
        let mut chain = Blockchain::new();
        for _ in 0..3 {
            chain.add(single_transaction(), 1).unwrap();
        }
        let ids: Vec<u32> = chain.iter().map(Block::id).collect();
        assert_eq!(ids, vec![2, 1, 0]);
    }

    #[test]
    fn find_transaction_walks_from_the_tip() {
        let mut chain = Blockchain::new();
        chain.add(single_transaction(), 1).unwrap();
        chain.add(three_transactions(), 1).unwrap();

        assert_eq!(chain.find_transaction(0).map(Transaction::id), Some(0));
        assert_eq!(chain.find_transaction(3).map(Transaction::id), Some(3));
        assert!(chain.find_transaction(4).is_none());
    }

    #[test]
    fn find_transaction_in_block_checks_that_block_only() {
        let mut chain = Blockchain::new();
        chain.add(single_transaction(), 1).unwrap();
        chain.add(three_transactions(), 1).unwrap();

        assert!(chain.find_transaction_in_block(0, 0).is_some());
        assert!(chain.find_transaction_in_block(0, 1).is_none());
        assert!(chain.find_transaction_in_block(2, 1).is_some());
        assert!(chain.find_transaction_in_block(2, 9).is_none());
    }

    #[test]
    fn verification_follows_the_transactions() {
        let oracle = Ed25519Oracle::new();

        let mut honest = Blockchain::new();
        honest
            .add(vec![Transaction::signed("payload", &oracle)], 1)
            .unwrap();
        assert!(honest.is_verified(&oracle));

        let mut forged = Blockchain::new();
        forged.add(single_transaction(), 1).unwrap();
        assert!(!forged.is_verified(&oracle));
    }
}
