//! Node configuration
//!
//! An explicitly constructed value passed to every component that needs it.
//! There is deliberately no ambient global: tests and multi-node setups
//! build as many configs as they need.

use crate::core::{Account, Difficulty};
use crate::error::{NodeError, Result};
use crate::network::Peer;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(45);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const GENESIS_FILE: &str = "genesis.json";
const BLOCK_LOG_FILE: &str = "blocks.db";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Directory holding the genesis file and the block log
    pub data_dir: PathBuf,
    pub ip: String,
    pub port: u16,
    /// Account credited with the block reward for locally mined blocks
    pub miner: Account,
    /// Peer seeded into the registry at startup, if any
    pub bootstrap: Option<Peer>,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
    pub difficulty: Difficulty,
}

impl NodeConfig {
    pub fn new(data_dir: &Path, ip: impl Into<String>, port: u16, miner: Account) -> NodeConfig {
        NodeConfig {
            data_dir: data_dir.to_path_buf(),
            ip: ip.into(),
            port,
            miner,
            bootstrap: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            difficulty: Difficulty::Standard,
        }
    }

    pub fn with_bootstrap(mut self, ip: impl Into<String>, port: u16) -> NodeConfig {
        self.bootstrap = Some(Peer::new(ip, port, true, false));
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> NodeConfig {
        self.sync_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> NodeConfig {
        self.request_timeout = timeout;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> NodeConfig {
        self.difficulty = difficulty;
        self
    }

    /// The address this node listens on and is known by.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// How this node describes itself when registering with a peer.
    pub fn self_peer(&self) -> Peer {
        Peer::new(self.ip.clone(), self.port, false, true)
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.data_dir.join(GENESIS_FILE)
    }

    pub fn block_log_path(&self) -> PathBuf {
        self.data_dir.join(BLOCK_LOG_FILE)
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            NodeError::Config(format!(
                "failed to create data dir {}: {e}",
                self.data_dir.display()
            ))
        })
    }
}
