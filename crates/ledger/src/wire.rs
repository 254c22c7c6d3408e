//! Recursive JSON wire format for a blockchain.
//!
//! The chain serializes as `{"currentBlock": <block | null>}` where each
//! block is `{"id", "nonce", "hash", "transactions", "previousBlock"}`,
//! nested tip to genesis. The nonce travels as its decimal string and the
//! hash as lowercase hex text. On decode, block ids are re-derived from
//! chain position and hashes are recomputed from the decoded parts; the
//! wire values for both are not trusted.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use ledger_types::{Block, Transaction};

use crate::chain::Blockchain;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChain {
    current_block: Option<WireBlock>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlock {
    id: u32,
    nonce: String,
    hash: String,
    transactions: Vec<Transaction>,
    previous_block: Option<Box<WireBlock>>,
}

impl From<&Blockchain> for WireChain {
    fn from(chain: &Blockchain) -> Self {
        let mut current = None;
        for block in chain.blocks() {
            current = Some(WireBlock {
                id: block.id(),
                nonce: block.nonce().to_string(),
                hash: block.hash().to_hex(),
                transactions: block.transactions().to_vec(),
                previous_block: current.map(Box::new),
            });
        }
        WireChain {
            current_block: current,
        }
    }
}

impl Serialize for Blockchain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireChain::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Blockchain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireChain::deserialize(deserializer)?;

        // Unnest tip-first, then rebuild genesis-up so each block links to
        // the one rebuilt before it.
        let mut lineage = Vec::new();
        let mut cursor = wire.current_block;
        while let Some(mut wire_block) = cursor {
            cursor = wire_block.previous_block.take().map(|boxed| *boxed);
            lineage.push(wire_block);
        }

        let mut blocks: Vec<Block> = Vec::with_capacity(lineage.len());
        for wire_block in lineage.into_iter().rev() {
            if wire_block.transactions.is_empty() {
                return Err(D::Error::custom("block carries no transactions"));
            }
            let nonce: u64 = wire_block
                .nonce
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid nonce {:?}", wire_block.nonce)))?;
            blocks.push(Block::with_nonce(
                wire_block.transactions,
                blocks.last(),
                nonce,
            ));
        }
        Ok(Blockchain::from_blocks(blocks))
    }
}
