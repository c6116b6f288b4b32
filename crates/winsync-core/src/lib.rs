//! Window Registry for multi-window scenes
//!
//! Independent browser windows of one application cannot see each other.
//! This crate lets them agree on who else is open and where, using a shared
//! key-value store as the only channel:
//!
//! - **Types**: `WindowDescriptor`, `Shape`, `RegistryState` (the stored blob)
//! - **Store**: `SharedStore` trait, `StorageChannel` JSON adapter, `MemoryStore`
//! - **Registry**: `RegistryClient`, the process-local owner of registry state
//! - **Monitor**: heartbeat schedule and liveness deadline
//! - **Dispatch**: observers for window-set and own-shape changes
//! - **Clock**: injectable wall clocks
//!
//! # Protocol
//!
//! Leaderless and polling-based. Every window re-reads the whole blob each
//! tick, drops its previous entry and every entry that has not been
//! refreshed within the liveness deadline, appends its own freshly stamped
//! entry and writes the blob back. Closing a window needs no cleanup: the
//! others simply stop seeing it refresh and evict it.
//!
//! ```text
//! ┌────────────── window A ──────────────┐   ┌────────────── window B ──────────────┐
//! │  LivenessMonitor ──tick──▶ Registry  │   │  Registry ◀──tick── LivenessMonitor  │
//! │                            Client    │   │  Client                              │
//! │  ChangeDispatcher ◀─────── │         │   │     │ ───────▶ ChangeDispatcher      │
//! └────────────────────────────┼─────────┘   └─────┼────────────────────────────────┘
//!                              ▼                   ▼
//!                   ┌──────────────────────────────────────┐
//!                   │  SharedStore  "{namespace}:windows"  │
//!                   └──────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use winsync_core::{ManualClock, MemoryStore, Metadata, RegistryClient, RegistryConfig, Shape};
//!
//! let store = MemoryStore::new();
//! let clock = ManualClock::new(0);
//!
//! let mut a = RegistryClient::new(store.clone(), clock.clone(), RegistryConfig::default()).unwrap();
//! let mut b = RegistryClient::new(store.clone(), clock.clone(), RegistryConfig::default()).unwrap();
//!
//! a.initialize(Metadata::new(), Shape::new(0.0, 0.0, 800.0, 600.0)).unwrap();
//! b.initialize(Metadata::new(), Shape::new(900.0, 0.0, 800.0, 600.0)).unwrap();
//!
//! clock.advance(250);
//! a.poll(Shape::new(0.0, 0.0, 800.0, 600.0));
//! assert_eq!(a.windows().len(), 2);
//! ```

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod store;
pub mod types;

// Re-export main types
pub use clock::{Clock, ManualClock};
#[cfg(not(target_arch = "wasm32"))]
pub use clock::SystemClock;
pub use dispatch::{ChangeDispatcher, ListenerId, ShapeChangedListener, WindowsChangedListener};
pub use error::{RegistryError, RegistryResult, StoreError};
pub use monitor::LivenessMonitor;
pub use registry::{RegistryClient, RegistryConfig};
pub use store::{MemoryStore, SharedStore, StorageChannel};
pub use types::{Metadata, Point, RegistryState, Shape, WindowDescriptor, WindowId};
