//! Proof-of-work nonce search
//!
//! Given a pending block, draw random nonces and fresh timestamps until the
//! block's hash meets the difficulty predicate. The search is unbounded and
//! probabilistic; the cancellation token is checked every iteration so an
//! in-flight search can be abandoned the instant a competing block arrives.

use crate::core::block::Block;
use crate::core::difficulty::Difficulty;
use crate::core::hash::Hash;
use crate::core::transaction::{Account, Transaction};
use crate::error::{NodeError, Result};
use crate::utils::current_timestamp;
use log::{debug, info};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Unmined block skeleton: the unit of work handed to the miner.
#[derive(Debug, Clone)]
pub struct PendingBlock {
    pub parent: Hash,
    pub number: u64,
    pub miner: Account,
    pub txs: Vec<Transaction>,
}

impl PendingBlock {
    pub fn new(parent: Hash, number: u64, miner: Account, txs: Vec<Transaction>) -> PendingBlock {
        PendingBlock {
            parent,
            number,
            miner,
            txs,
        }
    }
}

/// One-shot, idempotent "stop" signal carrying the reason it fired.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    fired: AtomicBool,
    reason: RwLock<Option<String>>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Fire the signal. Only the first reason is kept; later calls are no-ops.
    pub fn cancel(&self, reason: &str) {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut slot) = self.inner.reason.write() {
            *slot = Some(reason.to_string());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> String {
        self.inner
            .reason
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| "cancelled".to_string())
    }
}

/// Holds the token of the currently running search, if any, so other
/// activities (peer sync, shutdown) can cancel it.
#[derive(Default)]
pub struct MiningSlot {
    current: RwLock<Option<CancelToken>>,
}

impl MiningSlot {
    pub fn new() -> MiningSlot {
        MiningSlot::default()
    }

    pub fn set(&self, token: CancelToken) {
        if let Ok(mut slot) = self.current.write() {
            *slot = Some(token);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.current.write() {
            *slot = None;
        }
    }

    pub fn cancel(&self, reason: &str) {
        if let Ok(slot) = self.current.read() {
            if let Some(token) = slot.as_ref() {
                token.cancel(reason);
            }
        }
    }
}

/// Search for a nonce and timestamp making the pending block's hash satisfy
/// the difficulty predicate. Returns `MiningCancelled` when the token fires
/// before a valid hash is found; that is an expected outcome, not a fault.
pub fn mine(cancel: &CancelToken, pending: PendingBlock, difficulty: Difficulty) -> Result<Block> {
    let mut rng = rand::thread_rng();
    let mut block = Block::new(
        pending.parent,
        pending.number,
        0,
        current_timestamp()?,
        pending.miner,
        pending.txs,
    );

    let mut attempts: u64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(NodeError::MiningCancelled(cancel.reason()));
        }

        block.header.nonce = rng.gen();
        block.header.time = current_timestamp()?;
        attempts += 1;

        let hash = block.hash()?;
        if difficulty.is_met(&hash) {
            info!(
                "Mined block {} at height {} after {} attempts",
                hash, block.header.number, attempts
            );
            return Ok(block);
        }

        if attempts % 1_000_000 == 0 {
            debug!(
                "Still mining height {}: {} attempts",
                block.header.number, attempts
            );
        }
    }
}
