//! Data persistence and pending state
//!
//! The append-only block log that backs the ledger, and the in-memory
//! pool of transactions awaiting inclusion in a mined block.

pub mod block_log;
pub mod mempool;

pub use block_log::BlockLog;
pub use mempool::Mempool;
