// The core ledger state machine. Balances are never mutated directly by any
// other component: every change flows through add_block, which validates a
// candidate against chain linkage, proof-of-work and balance invariants on a
// scratch copy, persists it, and only then swaps the new state in.

use crate::core::block::{Block, BlockRecord};
use crate::core::difficulty::Difficulty;
use crate::core::genesis::Genesis;
use crate::core::hash::Hash;
use crate::core::transaction::{Account, Transaction};
use crate::error::{NodeError, Result};
use crate::storage::BlockLog;
use log::info;
use std::collections::HashMap;
use std::path::Path;

/// Fixed credit the block's declared miner receives per committed block.
pub const BLOCK_REWARD: u64 = 100;

pub struct Ledger {
    balances: HashMap<Account, u64>,
    latest_block: Option<Block>,
    latest_hash: Hash,
    log: BlockLog,
    difficulty: Difficulty,
}

impl Ledger {
    /// Initialize balances from genesis, then replay every committed block
    /// from the log through the same validate/apply path used for live
    /// commits. Replay fails fast on any corrupt line or hash mismatch
    /// rather than reconstruct an inconsistent balance table.
    pub fn open(genesis: &Genesis, log_path: &Path, difficulty: Difficulty) -> Result<Ledger> {
        let log = BlockLog::open(log_path)?;

        let mut ledger = Ledger {
            balances: genesis.balances.clone(),
            latest_block: None,
            latest_hash: Hash::ZERO,
            log,
            difficulty,
        };

        let records = ledger.log.replay()?;
        for record in records {
            let (hash, balances) = ledger.validate(&record.block)?;
            if hash != record.hash {
                return Err(NodeError::Io(format!(
                    "block log corruption: stored hash {} does not match recomputed hash {hash}",
                    record.hash
                )));
            }
            ledger.commit(record.block, hash, balances);
        }

        if let Some(block) = &ledger.latest_block {
            info!(
                "Ledger opened at height {} with tip {}",
                block.header.number, ledger.latest_hash
            );
        } else {
            info!("Ledger opened with no committed blocks");
        }

        Ok(ledger)
    }

    /// Height the next committed block must carry.
    pub fn next_block_number(&self) -> u64 {
        match &self.latest_block {
            Some(block) => block.header.number + 1,
            None => 0,
        }
    }

    pub fn latest_hash(&self) -> Hash {
        self.latest_hash
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.latest_block.as_ref()
    }

    pub fn balances(&self) -> &HashMap<Account, u64> {
        &self.balances
    }

    pub fn balance_of(&self, account: &Account) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// All committed blocks strictly after `from` (zero hash: whole chain).
    pub fn blocks_after(&self, from: Hash) -> Result<Vec<Block>> {
        self.log.blocks_after(from)
    }

    /// Validate and commit one block. The only way balances change.
    ///
    /// Atomic from the caller's perspective: every check runs against a
    /// scratch copy, and the live balances, tip and log are untouched
    /// unless the whole block applies.
    pub fn add_block(&mut self, block: &Block) -> Result<Hash> {
        let (hash, balances) = self.validate(block)?;

        self.log.append(&BlockRecord::new(hash, block.clone()))?;
        self.commit(block.clone(), hash, balances);

        info!(
            "Committed block {} at height {}",
            hash,
            self.next_block_number() - 1
        );
        Ok(hash)
    }

    /// The in-order subset of `txs` that cannot apply against the current
    /// committed balances. Fundable transactions are applied to a scratch
    /// copy as the batch is walked, so a pair that each pass in isolation
    /// but jointly overdraw their sender is caught here.
    pub fn unfundable(&self, txs: &[Transaction]) -> Vec<Transaction> {
        let mut balances = self.balances.clone();
        txs.iter()
            .filter(|&tx| Self::apply_tx(&mut balances, tx).is_err())
            .cloned()
            .collect()
    }

    /// Apply blocks in order, surfacing the first failure. Earlier commits
    /// stay committed; only a single add_block is atomic.
    pub fn add_blocks(&mut self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.add_block(block)?;
        }
        Ok(())
    }

    fn validate(&self, block: &Block) -> Result<(Hash, HashMap<Account, u64>)> {
        if let Some(latest) = &self.latest_block {
            let expected = latest.header.number + 1;
            if block.header.number != expected {
                return Err(NodeError::HeightMismatch {
                    expected,
                    actual: block.header.number,
                });
            }

            if latest.header.number > 0 && block.header.parent != self.latest_hash {
                return Err(NodeError::ParentMismatch {
                    expected: self.latest_hash,
                    actual: block.header.parent,
                });
            }
        }

        let hash = block.hash()?;
        if !self.difficulty.is_met(&hash) {
            return Err(NodeError::DifficultyNotMet(hash));
        }

        let mut balances = self.balances.clone();
        for tx in &block.payload {
            Self::apply_tx(&mut balances, tx)?;
        }
        *balances.entry(block.header.miner.clone()).or_insert(0) += BLOCK_REWARD;

        Ok((hash, balances))
    }

    fn apply_tx(balances: &mut HashMap<Account, u64>, tx: &Transaction) -> Result<()> {
        let available = balances.get(&tx.from).copied().unwrap_or(0);
        if available < tx.value {
            return Err(NodeError::InsufficientFunds {
                account: tx.from.to_string(),
                required: tx.value,
                available,
            });
        }

        balances.insert(tx.from.clone(), available - tx.value);
        *balances.entry(tx.to.clone()).or_insert(0) += tx.value;
        Ok(())
    }

    fn commit(&mut self, block: Block, hash: Hash, balances: HashMap<Account, u64>) {
        self.balances = balances;
        self.latest_hash = hash;
        self.latest_block = Some(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn genesis(balances: &[(&str, u64)]) -> Genesis {
        Genesis::new(
            balances
                .iter()
                .map(|(account, value)| (Account::from(*account), *value))
                .collect(),
        )
    }

    fn open_ledger(genesis: &Genesis) -> (Ledger, TempDir) {
        let dir = tempdir().unwrap();
        let ledger =
            Ledger::open(genesis, &dir.path().join("blocks.db"), Difficulty::Disabled).unwrap();
        (ledger, dir)
    }

    fn next_block(ledger: &Ledger, miner: &str, txs: Vec<Transaction>) -> Block {
        Block::new(
            ledger.latest_hash(),
            ledger.next_block_number(),
            7,
            1579451695,
            Account::from(miner),
            txs,
        )
    }

    fn transfer(from: &str, to: &str, value: u64) -> Transaction {
        Transaction::with_time(
            Account::from(from),
            Account::from(to),
            value,
            String::new(),
            1579451695,
        )
    }

    #[test]
    fn test_genesis_balances_and_empty_tip() {
        let (ledger, _dir) = open_ledger(&genesis(&[("alice", 10)]));
        assert_eq!(ledger.balance_of(&Account::from("alice")), 10);
        assert_eq!(ledger.next_block_number(), 0);
        assert!(ledger.latest_hash().is_zero());
    }

    #[test]
    fn test_add_block_transfers_and_rewards() {
        let (mut ledger, _dir) = open_ledger(&genesis(&[("alice", 10)]));

        let block = next_block(&ledger, "miner", vec![transfer("alice", "bob", 4)]);
        let hash = ledger.add_block(&block).unwrap();

        assert_eq!(ledger.latest_hash(), hash);
        assert_eq!(ledger.next_block_number(), 1);
        assert_eq!(ledger.balance_of(&Account::from("alice")), 6);
        assert_eq!(ledger.balance_of(&Account::from("bob")), 4);
        assert_eq!(ledger.balance_of(&Account::from("miner")), BLOCK_REWARD);
    }

    #[test]
    fn test_sequential_height_enforced() {
        let (mut ledger, _dir) = open_ledger(&genesis(&[]));
        ledger.add_block(&next_block(&ledger, "miner", vec![])).unwrap();

        // Height N+2 must be rejected.
        let mut skipped = next_block(&ledger, "miner", vec![]);
        skipped.header.number += 1;
        assert!(matches!(
            ledger.add_block(&skipped),
            Err(NodeError::HeightMismatch {
                expected: 1,
                actual: 2
            })
        ));

        // Height N+1 with correct parent succeeds.
        ledger.add_block(&next_block(&ledger, "miner", vec![])).unwrap();
        assert_eq!(ledger.next_block_number(), 2);
    }

    #[test]
    fn test_parent_linkage_enforced_past_height_zero() {
        let (mut ledger, _dir) = open_ledger(&genesis(&[]));
        ledger.add_block(&next_block(&ledger, "miner", vec![])).unwrap();
        ledger.add_block(&next_block(&ledger, "miner", vec![])).unwrap();

        let mut unlinked = next_block(&ledger, "miner", vec![]);
        unlinked.header.parent = Hash::ZERO;
        assert!(matches!(
            ledger.add_block(&unlinked),
            Err(NodeError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn test_insufficient_funds_rejected_without_partial_state() {
        let (mut ledger, dir) = open_ledger(&genesis(&[("alice", 10)]));
        let log_path = dir.path().join("blocks.db");
        let log_before = fs::read_to_string(&log_path).unwrap();

        let block = next_block(
            &ledger,
            "miner",
            vec![transfer("alice", "carol", 3), transfer("alice", "bob", 11)],
        );
        let err = ledger.add_block(&block).unwrap_err();
        assert!(matches!(err, NodeError::InsufficientFunds { .. }));

        // No partial application is observable: the first transfer in the
        // rejected block must not have leaked into the live state.
        assert_eq!(ledger.balance_of(&Account::from("alice")), 10);
        assert_eq!(ledger.balance_of(&Account::from("carol")), 0);
        assert_eq!(ledger.balance_of(&Account::from("miner")), 0);
        assert!(ledger.latest_hash().is_zero());
        assert_eq!(fs::read_to_string(&log_path).unwrap(), log_before);
    }

    #[test]
    fn test_unfundable_flags_joint_overdraw() {
        let (ledger, _dir) = open_ledger(&genesis(&[("alice", 10)]));

        // The middle transfer overdraws alice once the first has applied;
        // the last is funded by the first transfer's credit to bob.
        let batch = vec![
            transfer("alice", "bob", 10),
            transfer("alice", "carol", 10),
            transfer("bob", "carol", 5),
        ];
        assert_eq!(
            ledger.unfundable(&batch),
            vec![transfer("alice", "carol", 10)]
        );

        assert!(ledger.unfundable(&[transfer("alice", "bob", 10)]).is_empty());
    }

    #[test]
    fn test_difficulty_predicate_enforced() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::open(
            &genesis(&[]),
            &dir.path().join("blocks.db"),
            Difficulty::Standard,
        )
        .unwrap();

        let block = Block::new(Hash::ZERO, 0, 7, 1579451695, Account::from("miner"), vec![]);
        assert!(matches!(
            ledger.add_block(&block),
            Err(NodeError::DifficultyNotMet(_))
        ));
        assert_eq!(ledger.next_block_number(), 0);
    }

    #[test]
    fn test_add_blocks_surfaces_first_failure() {
        let (mut source, _source_dir) = open_ledger(&genesis(&[]));
        for _ in 0..3 {
            source.add_block(&next_block(&source, "miner", vec![])).unwrap();
        }
        let mut blocks = source.blocks_after(Hash::ZERO).unwrap();
        // Gap the sequence: heights become 0, 2.
        blocks.remove(1);

        let (mut ledger, _dir) = open_ledger(&genesis(&[]));
        assert!(matches!(
            ledger.add_blocks(&blocks),
            Err(NodeError::HeightMismatch {
                expected: 1,
                actual: 2
            })
        ));
        // The contiguous prefix stays committed.
        assert_eq!(ledger.next_block_number(), 1);
    }

    #[test]
    fn test_replay_reproduces_state() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("blocks.db");
        let genesis = genesis(&[("alice", 10)]);

        let mut ledger = Ledger::open(&genesis, &log_path, Difficulty::Disabled).unwrap();
        ledger
            .add_block(&next_block(&ledger, "miner", vec![transfer("alice", "bob", 4)]))
            .unwrap();
        ledger
            .add_block(&next_block(&ledger, "miner", vec![transfer("bob", "alice", 1)]))
            .unwrap();

        let balances = ledger.balances().clone();
        let tip = ledger.latest_hash();
        drop(ledger);

        let replayed = Ledger::open(&genesis, &log_path, Difficulty::Disabled).unwrap();
        assert_eq!(replayed.balances(), &balances);
        assert_eq!(replayed.latest_hash(), tip);
        assert_eq!(replayed.next_block_number(), 2);
    }

    #[test]
    fn test_replay_fails_on_tampered_hash() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("blocks.db");
        let genesis = genesis(&[]);

        let mut ledger = Ledger::open(&genesis, &log_path, Difficulty::Disabled).unwrap();
        ledger.add_block(&next_block(&ledger, "miner", vec![])).unwrap();
        drop(ledger);

        // Swap the stored hash for a different, well-formed one.
        let content = fs::read_to_string(&log_path).unwrap();
        let mut record: BlockRecord = serde_json::from_str(content.trim()).unwrap();
        record.hash.0[0] ^= 0xff;
        fs::write(
            &log_path,
            format!("{}\n", serde_json::to_string(&record).unwrap()),
        )
        .unwrap();

        assert!(matches!(
            Ledger::open(&genesis, &log_path, Difficulty::Disabled),
            Err(NodeError::Io(_))
        ));
    }
}
