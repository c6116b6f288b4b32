//! Window registry
//!
//! Owns this process's identity, the merged view of all known windows, the
//! heartbeat writes and the cooperative garbage collection of stale entries.

mod client;
mod config;
mod reconcile;

pub use client::RegistryClient;
pub use config::{
    RegistryConfig, DEFAULT_LIVENESS_MULTIPLIER, DEFAULT_NAMESPACE, DEFAULT_TICK_INTERVAL_MS,
    MIN_LIVENESS_MULTIPLIER,
};
