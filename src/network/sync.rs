//! Periodic peer synchronization
//!
//! Every cycle polls each known peer's status, pulls any missing block
//! suffix through the ledger's validation path, and merges newly learned
//! peers into the registry. One misbehaving or unreachable peer never
//! aborts the cycle for the others.

use crate::core::{Block, Hash, Ledger, MiningSlot};
use crate::error::{NodeError, Result};
use crate::network::peer::{Peer, PeerRegistry};
use crate::network::server::{send_request, Request, Response};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

const SHUTDOWN_POLL_WAIT: Duration = Duration::from_millis(200);

pub struct Synchronizer {
    ledger: Arc<RwLock<Ledger>>,
    registry: Arc<PeerRegistry>,
    mining_slot: Arc<MiningSlot>,
    self_peer: Peer,
    timeout: Duration,
}

impl Synchronizer {
    pub fn new(
        ledger: Arc<RwLock<Ledger>>,
        registry: Arc<PeerRegistry>,
        mining_slot: Arc<MiningSlot>,
        self_peer: Peer,
        timeout: Duration,
    ) -> Synchronizer {
        Synchronizer {
            ledger,
            registry,
            mining_slot,
            self_peer,
            timeout,
        }
    }

    /// Run cycles on a fixed interval until the shutdown flag is set. The
    /// interval sleep is chunked so shutdown is observed promptly, and an
    /// in-progress cycle always finishes its current commit.
    pub fn run(&self, interval: Duration, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::SeqCst) {
            self.run_cycle();

            let started = Instant::now();
            while started.elapsed() < interval {
                if shutdown.load(Ordering::SeqCst) {
                    return;
                }
                thread::sleep(SHUTDOWN_POLL_WAIT);
            }
        }
    }

    /// One pass over the current peer set.
    pub fn run_cycle(&self) {
        let peers = self.registry.peers();
        if peers.is_empty() {
            return;
        }
        info!("Searching for new blocks and peers ({} known)", peers.len());

        for peer in peers {
            if let Err(e) = self.sync_with_peer(&peer) {
                warn!("Sync with peer {} failed: {e}", peer.address());
                // Unreachable discovered peers are dropped until someone
                // re-announces them; bootstrap peers are kept regardless.
                if matches!(e, NodeError::Network(_)) && !peer.is_bootstrap {
                    self.registry.remove(&peer.address());
                }
            }
        }
    }

    fn sync_with_peer(&self, peer: &Peer) -> Result<()> {
        let status = send_request(&peer.address(), &Request::GetStatus, self.timeout)?;
        let (peer_height, known_peers) = match status {
            Response::Status {
                height,
                known_peers,
                ..
            } => (height, known_peers),
            Response::Error { message } => return Err(NodeError::Network(message)),
            other => {
                return Err(NodeError::Network(format!(
                    "unexpected status response: {other:?}"
                )))
            }
        };

        if !peer.connected {
            self.join_peer(peer)?;
        }

        self.sync_blocks(peer, peer_height)?;
        self.merge_peers(known_peers);
        Ok(())
    }

    /// Announce ourselves to a peer we have not talked to before, so both
    /// sides know each other after the first contact.
    fn join_peer(&self, peer: &Peer) -> Result<()> {
        let request = Request::AddPeer {
            peer: self.self_peer.clone(),
        };
        match send_request(&peer.address(), &request, self.timeout)? {
            Response::Ack => {
                self.registry.mark_connected(&peer.address());
                info!("Joined peer {}", peer.address());
                Ok(())
            }
            Response::Error { message } => Err(NodeError::Network(message)),
            other => Err(NodeError::Network(format!(
                "unexpected add-peer response: {other:?}"
            ))),
        }
    }

    /// Pull exactly the missing suffix when the peer's chain is longer, and
    /// commit it through the ledger's validation path.
    fn sync_blocks(&self, peer: &Peer, peer_height: u64) -> Result<()> {
        let (local_height, local_hash) = {
            let ledger = self
                .ledger
                .read()
                .expect("Failed to acquire read lock on ledger");
            (ledger.next_block_number(), ledger.latest_hash())
        };

        if peer_height <= local_height {
            return Ok(());
        }
        info!(
            "Found {} new blocks from peer {}",
            peer_height - local_height,
            peer.address()
        );

        let blocks = self.fetch_blocks_after(peer, local_hash)?;
        {
            let mut ledger = self
                .ledger
                .write()
                .expect("Failed to acquire write lock on ledger");
            ledger.add_blocks(&blocks)?;
        }

        // Any local search is now racing for a height a peer already won.
        self.mining_slot
            .cancel(&format!("chain advanced by peer {}", peer.address()));
        Ok(())
    }

    fn fetch_blocks_after(&self, peer: &Peer, from: Hash) -> Result<Vec<Block>> {
        let request = Request::GetBlocksAfter { from };
        match send_request(&peer.address(), &request, self.timeout)? {
            Response::Blocks { blocks } => Ok(blocks),
            Response::Error { message } => Err(NodeError::Network(message)),
            other => Err(NodeError::Network(format!(
                "unexpected blocks response: {other:?}"
            ))),
        }
    }

    /// Transitive peer discovery: adopt every peer the remote knows that we
    /// do not, excluding ourselves.
    fn merge_peers(&self, peers: Vec<Peer>) {
        for peer in peers {
            if self.registry.is_known(&peer.address()) {
                continue;
            }
            info!("Found new peer {}", peer.address());
            self.registry.add(Peer {
                is_bootstrap: false,
                connected: false,
                ..peer
            });
        }
    }
}
