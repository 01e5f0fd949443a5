//! Peer-to-peer networking
//!
//! The request/response surface a node exposes over TCP, the registry of
//! known peers, and the periodic synchronizer that keeps the local chain
//! caught up with the network.

pub mod peer;
pub mod server;
pub mod sync;

pub use peer::{Peer, PeerRegistry};
pub use server::{send_request, Node, Request, Response};
pub use sync::Synchronizer;
