//! Pending-transaction pool
//!
//! Submitted transactions queue here in arrival order until the miner
//! seals them into a block. Thread-safe; shared between the request
//! handlers that enqueue and the mining loop that drains.

use crate::core::transaction::Transaction;
use std::sync::RwLock;

pub struct Mempool {
    inner: RwLock<Vec<Transaction>>,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool {
            inner: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, tx: Transaction) {
        match self.inner.write() {
            Ok(mut pool) => pool.push(tx),
            Err(_) => log::error!("Failed to acquire write lock on mempool"),
        }
    }

    /// Arrival-ordered copy of the current pool.
    pub fn snapshot(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.clone(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                Vec::new()
            }
        }
    }

    /// Drop one pool entry, in arrival order, for each given transaction.
    ///
    /// Identical submissions are distinct entries: committing one leaves
    /// the other pooled rather than silently losing it.
    pub fn remove(&self, txs: &[Transaction]) {
        match self.inner.write() {
            Ok(mut pool) => {
                let mut pending = txs.to_vec();
                pool.retain(|tx| match pending.iter().position(|p| p == tx) {
                    Some(i) => {
                        pending.swap_remove(i);
                        false
                    }
                    None => true,
                });
            }
            Err(_) => log::error!("Failed to acquire write lock on mempool"),
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
