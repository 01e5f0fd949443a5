//! Genesis balances
//!
//! The starting account->balance mapping a node is born with. Loaded once
//! at startup; written out with empty balances on first run if absent.

use crate::core::transaction::Account;
use crate::error::{NodeError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Genesis {
    pub balances: HashMap<Account, u64>,
}

impl Genesis {
    pub fn new(balances: HashMap<Account, u64>) -> Genesis {
        Genesis { balances }
    }

    pub fn load(path: &Path) -> Result<Genesis> {
        let content = fs::read_to_string(path).map_err(|e| {
            NodeError::Io(format!("failed to read genesis file {}: {e}", path.display()))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            NodeError::Serialization(format!(
                "failed to parse genesis file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            NodeError::Io(format!(
                "failed to write genesis file {}: {e}",
                path.display()
            ))
        })
    }

    /// Load the genesis file, creating one with empty balances if missing.
    pub fn load_or_init(path: &Path) -> Result<Genesis> {
        if !path.exists() {
            let genesis = Genesis::default();
            genesis.write(path)?;
            return Ok(genesis);
        }
        Genesis::load(path)
    }
}
