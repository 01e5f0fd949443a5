//! Core ledger functionality
//!
//! The fundamental pieces of the node: hashes and canonical encoding,
//! blocks and transactions, the difficulty predicate, the ledger state
//! machine and the proof-of-work miner.

pub mod block;
pub mod difficulty;
pub mod genesis;
pub mod hash;
pub mod ledger;
pub mod miner;
pub mod transaction;

pub use block::{Block, BlockHeader, BlockRecord};
pub use difficulty::{is_valid_hash, Difficulty};
pub use genesis::Genesis;
pub use hash::Hash;
pub use ledger::{Ledger, BLOCK_REWARD};
pub use miner::{mine, CancelToken, MiningSlot, PendingBlock};
pub use transaction::{Account, Transaction};
