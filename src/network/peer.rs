//! Peer identity and registry
//!
//! Peers are keyed by their `ip:port` pair. The registry owns the node's
//! view of the network, always excluding the node's own address so it never
//! tries to sync with itself. Bootstrap peers are seeded at startup and are
//! never evicted even when unreachable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub ip: String,
    pub port: u16,
    pub is_bootstrap: bool,
    pub connected: bool,
}

impl Peer {
    pub fn new(ip: impl Into<String>, port: u16, is_bootstrap: bool, connected: bool) -> Peer {
        Peer {
            ip: ip.into(),
            port,
            is_bootstrap,
            connected,
        }
    }

    /// The registry key and dial address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

pub struct PeerRegistry {
    self_address: String,
    inner: RwLock<HashMap<String, Peer>>,
}

impl PeerRegistry {
    pub fn new(self_address: impl Into<String>) -> PeerRegistry {
        PeerRegistry {
            self_address: self_address.into(),
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn self_address(&self) -> &str {
        &self.self_address
    }

    /// Insert or overwrite by key. The node's own address is ignored.
    pub fn add(&self, peer: Peer) {
        if peer.address() == self.self_address {
            return;
        }
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer registry");
        inner.insert(peer.address(), peer);
    }

    pub fn remove(&self, address: &str) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer registry");
        inner.remove(address);
    }

    /// The node's own address is trivially known, preventing self-connection.
    pub fn is_known(&self, address: &str) -> bool {
        if address == self.self_address {
            return true;
        }
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on peer registry");
        inner.contains_key(address)
    }

    pub fn mark_connected(&self, address: &str) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on peer registry");
        if let Some(peer) = inner.get_mut(address) {
            peer.connected = true;
        }
    }

    pub fn peers(&self) -> Vec<Peer> {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on peer registry");
        inner.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on peer registry");
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
