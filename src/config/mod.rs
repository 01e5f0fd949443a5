//! Configuration management
//!
//! Node settings built from CLI flags and passed explicitly to the
//! components that need them.

pub mod settings;

pub use settings::{NodeConfig, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SYNC_INTERVAL};
