//! Error handling for the ledger node
//!
//! One crate-wide error type covering the validation, I/O, network and
//! mining-cancellation outcomes every component reports.

use crate::core::hash::Hash;
use std::fmt;

/// Result type alias for node operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Error types for all ledger node operations
#[derive(Debug, Clone)]
pub enum NodeError {
    /// Block height is not exactly one past the current tip
    HeightMismatch { expected: u64, actual: u64 },
    /// Block does not link to the current tip hash
    ParentMismatch { expected: Hash, actual: Hash },
    /// A transaction spends more than the sender holds
    InsufficientFunds {
        account: String,
        required: u64,
        available: u64,
    },
    /// Block hash does not satisfy the difficulty predicate
    DifficultyNotMet(Hash),
    /// A blocks-after query named a hash not present in the local chain
    UnknownBlock(Hash),
    /// A mining search was cancelled; carries the reason the signal fired
    MiningCancelled(String),
    /// Block log or genesis file I/O failure
    Io(String),
    /// JSON encode/decode failure
    Serialization(String),
    /// Peer communication failure (unreachable, timeout, malformed reply)
    Network(String),
    /// Bad node configuration
    Config(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::HeightMismatch { expected, actual } => {
                write!(f, "height mismatch: expected {expected}, got {actual}")
            }
            NodeError::ParentMismatch { expected, actual } => {
                write!(f, "parent mismatch: expected {expected}, got {actual}")
            }
            NodeError::InsufficientFunds {
                account,
                required,
                available,
            } => {
                write!(
                    f,
                    "insufficient funds: account '{account}' has {available}, needs {required}"
                )
            }
            NodeError::DifficultyNotMet(hash) => {
                write!(f, "block hash {hash} does not meet the difficulty target")
            }
            NodeError::UnknownBlock(hash) => {
                write!(f, "hash {hash} is not part of the local chain")
            }
            NodeError::MiningCancelled(reason) => write!(f, "mining cancelled: {reason}"),
            NodeError::Io(msg) => write!(f, "I/O error: {msg}"),
            NodeError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            NodeError::Network(msg) => write!(f, "network error: {msg}"),
            NodeError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for NodeError {}

impl From<std::io::Error> for NodeError {
    fn from(err: std::io::Error) -> Self {
        NodeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> Self {
        NodeError::Serialization(err.to_string())
    }
}

impl NodeError {
    /// True for the rejections produced by block validation, which callers
    /// surface but never retry blindly.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NodeError::HeightMismatch { .. }
                | NodeError::ParentMismatch { .. }
                | NodeError::InsufficientFunds { .. }
                | NodeError::DifficultyNotMet(_)
        )
    }
}
