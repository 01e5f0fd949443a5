//! Append-only block log
//!
//! One JSON object per line, appended and flushed on every commit, never
//! rewritten in place. A corrupt or truncated line is a fatal replay error:
//! reconstructing balances from a partial log would silently diverge from
//! what peers believe, so startup fails fast instead.

use crate::core::block::{Block, BlockRecord};
use crate::core::hash::Hash;
use crate::error::{NodeError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub struct BlockLog {
    file: File,
    path: PathBuf,
}

impl BlockLog {
    /// Open the log for appending, creating an empty file if missing.
    pub fn open(path: &Path) -> Result<BlockLog> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                NodeError::Io(format!("failed to open block log {}: {e}", path.display()))
            })?;

        Ok(BlockLog {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every committed record in file order.
    pub fn replay(&self) -> Result<Vec<BlockRecord>> {
        Self::read_records(&self.path)
    }

    /// Append one record as a single line and flush before returning.
    pub fn append(&mut self, record: &BlockRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.file
            .write_all(&line)
            .map_err(|e| NodeError::Io(format!("failed to append to block log: {e}")))?;
        self.file
            .flush()
            .map_err(|e| NodeError::Io(format!("failed to flush block log: {e}")))?;

        Ok(())
    }

    /// All blocks strictly after `from`, in file (ascending height) order.
    ///
    /// The zero hash means "from genesis": the entire chain is returned.
    /// Any other hash must identify a committed block, otherwise the caller
    /// is asking about a chain this node does not have.
    pub fn blocks_after(&self, from: Hash) -> Result<Vec<Block>> {
        let records = self.replay()?;

        if from.is_zero() {
            return Ok(records.into_iter().map(|r| r.block).collect());
        }

        let position = records
            .iter()
            .position(|r| r.hash == from)
            .ok_or(NodeError::UnknownBlock(from))?;

        Ok(records
            .into_iter()
            .skip(position + 1)
            .map(|r| r.block)
            .collect())
    }

    fn read_records(path: &Path) -> Result<Vec<BlockRecord>> {
        let file = File::open(path)
            .map_err(|e| NodeError::Io(format!("failed to open block log {}: {e}", path.display())))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| NodeError::Io(format!("failed to read block log line: {e}")))?;

            let record: BlockRecord = serde_json::from_str(&line).map_err(|e| {
                NodeError::Serialization(format!(
                    "corrupt block log line {} in {}: {e}",
                    index + 1,
                    path.display()
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::Account;
    use std::fs;
    use tempfile::tempdir;

    fn record(number: u64, parent: Hash) -> BlockRecord {
        let block = Block::new(parent, number, 42, 1579451695, Account::from("andrej"), vec![]);
        let hash = block.hash().unwrap();
        BlockRecord::new(hash, block)
    }

    #[test]
    fn test_append_then_replay() {
        let dir = tempdir().unwrap();
        let mut log = BlockLog::open(&dir.path().join("blocks.db")).unwrap();

        let first = record(0, Hash::ZERO);
        let second = record(1, first.hash);
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let records = log.replay().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hash, first.hash);
        assert_eq!(records[1].block.header.number, 1);
    }

    #[test]
    fn test_replay_fails_on_corrupt_trailing_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.db");

        let mut log = BlockLog::open(&path).unwrap();
        log.append(&record(0, Hash::ZERO)).unwrap();

        // Simulate a partially written final line.
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{\"hash\":\"dead");
        fs::write(&path, content).unwrap();

        let log = BlockLog::open(&path).unwrap();
        assert!(matches!(log.replay(), Err(NodeError::Serialization(_))));
    }

    #[test]
    fn test_blocks_after_zero_hash_returns_whole_chain() {
        let dir = tempdir().unwrap();
        let mut log = BlockLog::open(&dir.path().join("blocks.db")).unwrap();

        let first = record(0, Hash::ZERO);
        let second = record(1, first.hash);
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let blocks = log.blocks_after(Hash::ZERO).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].header.number, 0);
    }

    #[test]
    fn test_blocks_after_known_hash_returns_suffix() {
        let dir = tempdir().unwrap();
        let mut log = BlockLog::open(&dir.path().join("blocks.db")).unwrap();

        let first = record(0, Hash::ZERO);
        let second = record(1, first.hash);
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let blocks = log.blocks_after(first.hash).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].header.number, 1);

        // After the tip there is nothing.
        assert!(log.blocks_after(second.hash).unwrap().is_empty());
    }

    #[test]
    fn test_blocks_after_unknown_hash_fails() {
        let dir = tempdir().unwrap();
        let mut log = BlockLog::open(&dir.path().join("blocks.db")).unwrap();
        log.append(&record(0, Hash::ZERO)).unwrap();

        let mut unknown = Hash::ZERO;
        unknown.0[0] = 0xff;
        assert!(matches!(
            log.blocks_after(unknown),
            Err(NodeError::UnknownBlock(_))
        ));
    }
}
