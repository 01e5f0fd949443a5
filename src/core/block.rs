//! Blocks and their canonical encoding
//!
//! A block's identity is the SHA-256 digest of its canonical JSON bytes.
//! The hash is always computed from content, never stored as mutable state
//! on the block itself; the persisted log line pairs the digest with the
//! block it was computed from.

use crate::core::hash::Hash;
use crate::core::transaction::{Account, Transaction};
use crate::error::Result;
use crate::utils::sha256_digest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub parent: Hash,
    pub number: u64,
    pub nonce: u64,
    pub time: u64,
    pub miner: Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub payload: Vec<Transaction>,
}

impl Block {
    pub fn new(
        parent: Hash,
        number: u64,
        nonce: u64,
        time: u64,
        miner: Account,
        txs: Vec<Transaction>,
    ) -> Block {
        Block {
            header: BlockHeader {
                parent,
                number,
                nonce,
                time,
                miner,
            },
            payload: txs,
        }
    }

    /// Digest of the canonical JSON encoding. Field order is fixed by the
    /// struct declarations, so the bytes are deterministic.
    pub fn hash(&self) -> Result<Hash> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Hash(sha256_digest(&bytes)))
    }
}

/// One line of the append-only block log: the block plus its digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub hash: Hash,
    pub block: Block,
}

impl BlockRecord {
    pub fn new(hash: Hash, block: Block) -> BlockRecord {
        BlockRecord { hash, block }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block::new(
            Hash::ZERO,
            0,
            127,
            1579451695,
            Account::from("andrej"),
            vec![Transaction::with_time(
                Account::from("andrej"),
                Account::from("babayaga"),
                1,
                String::new(),
                1579451695,
            )],
        )
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = sample_block();
        assert_eq!(block.hash().unwrap(), block.hash().unwrap());
    }

    #[test]
    fn test_hash_changes_with_nonce() {
        let block = sample_block();
        let mut other = block.clone();
        other.header.nonce += 1;
        assert_ne!(block.hash().unwrap(), other.hash().unwrap());
    }

    #[test]
    fn test_record_line_shape() {
        let block = sample_block();
        let record = BlockRecord::new(block.hash().unwrap(), block);

        let line = serde_json::to_string(&record).unwrap();
        assert!(line.starts_with(r#"{"hash":""#));
        assert!(line.contains(r#""block":{"header":{"parent":"#));
        assert!(line.contains(r#""payload":[{"from":"#));

        let back: BlockRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back.block, record.block);
        assert_eq!(back.hash, record.block.hash().unwrap());
    }
}
