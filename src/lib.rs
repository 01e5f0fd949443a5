//! # Tinychain - A Minimal Single-Chain Ledger Node
//!
//! A replicated append-only account-balance ledger secured by proof-of-work
//! mining and kept consistent across peers through periodic gossip-style
//! synchronization.
//!
//! ## Layout
//! - `core/`: hashes and canonical encoding, blocks, the difficulty
//!   predicate, the ledger state machine and the miner
//! - `storage/`: the append-only JSON-lines block log and the mempool
//! - `network/`: the TCP request/response surface, peer registry and the
//!   periodic synchronizer
//! - `config/`: explicit node configuration (no globals)
//! - `cli/`: command-line interface for running and talking to nodes
//!
//! ## The moving parts
//! Submitted transactions queue in the mempool; the mining loop seals them
//! into blocks whose hashes satisfy the difficulty predicate; the ledger
//! validates and commits every block (locally mined or pulled from a peer)
//! through one atomic path; the synchronizer polls peers on a fixed
//! interval, fetching missing block suffixes and propagating peer
//! knowledge transitively. There is no fork choice: the chain is a single
//! canonical, monotonically growing log.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{NodeConfig, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYNC_INTERVAL};
pub use core::{
    is_valid_hash, mine, Account, Block, BlockHeader, BlockRecord, CancelToken, Difficulty,
    Genesis, Hash, Ledger, MiningSlot, PendingBlock, Transaction, BLOCK_REWARD,
};
pub use error::{NodeError, Result};
pub use network::{send_request, Node, Peer, PeerRegistry, Request, Response, Synchronizer};
pub use storage::{BlockLog, Mempool};
