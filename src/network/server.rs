//! Node process and TCP request/response surface
//!
//! One JSON request per connection, one JSON response back, streamed with
//! serde_json directly over the `TcpStream`. The node wires
//! together the ledger, mempool, peer registry, mining loop and sync loop;
//! every handler calls into those through the same locking discipline.

use crate::config::NodeConfig;
use crate::core::{
    mine, Account, Block, CancelToken, Genesis, Hash, Ledger, MiningSlot, PendingBlock,
    Transaction,
};
use crate::error::{NodeError, Result};
use crate::network::peer::{Peer, PeerRegistry};
use crate::network::sync::Synchronizer;
use crate::storage::Mempool;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufReader;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

const MINER_IDLE_WAIT: Duration = Duration::from_millis(500);
const ACCEPT_POLL_WAIT: Duration = Duration::from_millis(100);

/// Wire requests a node accepts and sends to peers.
#[derive(Debug, Serialize, Deserialize)]
pub enum Request {
    GetStatus,
    GetBalances,
    GetBlocksAfter { from: Hash },
    AddPeer { peer: Peer },
    SubmitTx {
        from: Account,
        to: Account,
        value: u64,
        data: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Response {
    Status {
        latest_hash: Hash,
        height: u64,
        known_peers: Vec<Peer>,
    },
    Balances {
        latest_hash: Hash,
        balances: HashMap<Account, u64>,
    },
    Blocks { blocks: Vec<Block> },
    Ack,
    Error { message: String },
}

/// A running ledger node. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct Node {
    config: Arc<NodeConfig>,
    ledger: Arc<RwLock<Ledger>>,
    mempool: Arc<Mempool>,
    registry: Arc<PeerRegistry>,
    mining_slot: Arc<MiningSlot>,
    shutdown: Arc<AtomicBool>,
}

impl Node {
    /// Bootstrap the data directory, open the ledger (replaying the block
    /// log) and seed the peer registry with the configured bootstrap peer.
    pub fn new(config: NodeConfig) -> Result<Node> {
        config.ensure_data_dir()?;
        let genesis = Genesis::load_or_init(&config.genesis_path())?;
        let ledger = Ledger::open(&genesis, &config.block_log_path(), config.difficulty)?;

        let registry = PeerRegistry::new(config.address());
        if let Some(bootstrap) = &config.bootstrap {
            registry.add(bootstrap.clone());
        }

        Ok(Node {
            config: Arc::new(config),
            ledger: Arc::new(RwLock::new(ledger)),
            mempool: Arc::new(Mempool::new()),
            registry: Arc::new(registry),
            mining_slot: Arc::new(MiningSlot::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn mining_slot(&self) -> &Arc<MiningSlot> {
        &self.mining_slot
    }

    /// The synchronizer for this node's ledger and registry.
    pub fn synchronizer(&self) -> Synchronizer {
        Synchronizer::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.registry),
            Arc::clone(&self.mining_slot),
            self.config.self_peer(),
            self.config.request_timeout,
        )
    }

    /// Serve requests, mine and sync until `shutdown` is called.
    ///
    /// Both background loops poll the shutdown flag every iteration and are
    /// joined before this returns, so the ledger (and its log file handle)
    /// is only released once nothing is mid-commit.
    pub fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.address()).map_err(|e| {
            NodeError::Network(format!("failed to bind to {}: {e}", self.config.address()))
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| NodeError::Network(format!("failed to set nonblocking accept: {e}")))?;

        info!("Node listening on {}", self.config.address());

        let sync_node = self.clone();
        let sync_handle = thread::spawn(move || {
            sync_node
                .synchronizer()
                .run(sync_node.config.sync_interval, &sync_node.shutdown);
        });

        let miner_node = self.clone();
        let miner_handle = thread::spawn(move || miner_node.run_miner());

        while !self.shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    let node = self.clone();
                    thread::spawn(move || {
                        if let Err(e) = node.handle_connection(stream) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_WAIT);
                }
                Err(e) => error!("Error accepting connection: {e}"),
            }
        }

        let _ = sync_handle.join();
        let _ = miner_handle.join();
        info!("Node stopped");
        Ok(())
    }

    /// Signal every loop to stop, cancelling any in-flight mining search.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.mining_slot.cancel("node shutting down");
    }

    fn handle_connection(&self, stream: TcpStream) -> Result<()> {
        // The listener is nonblocking so the accept loop can watch the
        // shutdown flag; accepted streams must not inherit that.
        stream
            .set_nonblocking(false)
            .map_err(|e| NodeError::Network(format!("failed to set blocking stream: {e}")))?;
        stream
            .set_read_timeout(Some(self.config.request_timeout))
            .map_err(|e| NodeError::Network(format!("failed to set read timeout: {e}")))?;

        let mut reader = serde_json::Deserializer::from_reader(BufReader::new(&stream));
        let request = Request::deserialize(&mut reader)
            .map_err(|e| NodeError::Network(format!("malformed request: {e}")))?;

        let response = self.handle_request(request);
        serde_json::to_writer(&stream, &response)
            .map_err(|e| NodeError::Network(format!("failed to write response: {e}")))?;

        Ok(())
    }

    /// The semantics behind every inbound endpoint. Errors become a typed
    /// `Error` response carrying the specific invariant that was violated.
    pub fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::GetStatus => self.status(),
            Request::GetBalances => {
                let ledger = self
                    .ledger
                    .read()
                    .expect("Failed to acquire read lock on ledger");
                Response::Balances {
                    latest_hash: ledger.latest_hash(),
                    balances: ledger.balances().clone(),
                }
            }
            Request::GetBlocksAfter { from } => {
                let ledger = self
                    .ledger
                    .read()
                    .expect("Failed to acquire read lock on ledger");
                match ledger.blocks_after(from) {
                    Ok(blocks) => Response::Blocks { blocks },
                    Err(e) => Response::Error {
                        message: e.to_string(),
                    },
                }
            }
            Request::AddPeer { peer } => {
                info!("Peer {} registered itself", peer.address());
                self.registry.add(Peer {
                    connected: true,
                    ..peer
                });
                Response::Ack
            }
            Request::SubmitTx {
                from,
                to,
                value,
                data,
            } => match self.submit_tx(from, to, value, data) {
                Ok(()) => Response::Ack,
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            },
        }
    }

    /// Own latest hash, chain length and known peers.
    pub fn status(&self) -> Response {
        let (latest_hash, height) = {
            let ledger = self
                .ledger
                .read()
                .expect("Failed to acquire read lock on ledger");
            (ledger.latest_hash(), ledger.next_block_number())
        };

        Response::Status {
            latest_hash,
            height,
            known_peers: self.registry.peers(),
        }
    }

    /// Enqueue a submitted transaction after a committed-balance check, so
    /// an obviously unfundable transfer is rejected at the door instead of
    /// poisoning a mined block later.
    fn submit_tx(&self, from: Account, to: Account, value: u64, data: String) -> Result<()> {
        let available = self
            .ledger
            .read()
            .expect("Failed to acquire read lock on ledger")
            .balance_of(&from);
        if available < value {
            return Err(NodeError::InsufficientFunds {
                account: from.to_string(),
                required: value,
                available,
            });
        }

        let tx = Transaction::new(from, to, value, data)?;
        info!(
            "Accepted transaction {} -> {} ({})",
            tx.from, tx.to, tx.value
        );
        self.mempool.add(tx);
        Ok(())
    }

    /// Drop pooled transactions that no longer apply against the committed
    /// balances. The door check in `submit_tx` sees each submission alone;
    /// submissions that jointly overdraw a sender only surface when the
    /// mined block is validated, and left pooled they would fail the same
    /// way on every retry and block all later transactions.
    fn evict_unfundable(&self) {
        let pool = self.mempool.snapshot();
        if pool.is_empty() {
            return;
        }

        let unfundable = {
            let ledger = self
                .ledger
                .read()
                .expect("Failed to acquire read lock on ledger");
            ledger.unfundable(&pool)
        };
        if unfundable.is_empty() {
            return;
        }

        warn!(
            "Evicting {} unfundable transaction(s) from the pool",
            unfundable.len()
        );
        self.mempool.remove(&unfundable);
    }

    /// Continuously try to seal the pending pool into a mined block.
    ///
    /// The miner never holds the ledger lock while searching: it reads the
    /// tip to frame a pending block, releases the lock, searches, and only
    /// reacquires it to commit the result.
    fn run_miner(&self) {
        while !self.shutdown.load(Ordering::SeqCst) {
            let txs = self.mempool.snapshot();
            if txs.is_empty() {
                thread::sleep(MINER_IDLE_WAIT);
                continue;
            }

            let (parent, number) = {
                let ledger = self
                    .ledger
                    .read()
                    .expect("Failed to acquire read lock on ledger");
                (ledger.latest_hash(), ledger.next_block_number())
            };

            let pending =
                PendingBlock::new(parent, number, self.config.miner.clone(), txs);
            let token = CancelToken::new();
            self.mining_slot.set(token.clone());
            let outcome = mine(&token, pending, self.config.difficulty);
            self.mining_slot.clear();

            match outcome {
                Ok(block) => {
                    let committed = {
                        let mut ledger = self
                            .ledger
                            .write()
                            .expect("Failed to acquire write lock on ledger");
                        ledger.add_block(&block)
                    };
                    match committed {
                        Ok(hash) => {
                            info!("New locally mined block {hash}");
                            self.mempool.remove(&block.payload);
                        }
                        // Either the chain moved underneath us (a peer's
                        // block won the height) or the batch itself cannot
                        // apply. Transactions that are still fundable on
                        // the current tip survive the sweep and retry.
                        Err(e) => {
                            warn!("Mined block rejected: {e}");
                            self.evict_unfundable();
                        }
                    }
                }
                Err(NodeError::MiningCancelled(reason)) => {
                    info!("Mining attempt abandoned: {reason}");
                }
                Err(e) => error!("Mining failed: {e}"),
            }
        }
    }
}

/// Send one request to a peer and read the typed response, within `timeout`.
pub fn send_request(address: &str, request: &Request, timeout: Duration) -> Result<Response> {
    let socket_addr = address
        .to_socket_addrs()
        .map_err(|e| NodeError::Network(format!("invalid address {address}: {e}")))?
        .next()
        .ok_or_else(|| NodeError::Network(format!("address {address} did not resolve")))?;

    let stream = TcpStream::connect_timeout(&socket_addr, timeout)
        .map_err(|e| NodeError::Network(format!("failed to connect to {address}: {e}")))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| NodeError::Network(format!("failed to set read timeout: {e}")))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| NodeError::Network(format!("failed to set write timeout: {e}")))?;

    serde_json::to_writer(&stream, request)
        .map_err(|e| NodeError::Network(format!("failed to send request to {address}: {e}")))?;

    let mut reader = serde_json::Deserializer::from_reader(BufReader::new(&stream));
    Response::deserialize(&mut reader)
        .map_err(|e| NodeError::Network(format!("malformed response from {address}: {e}")))
}
