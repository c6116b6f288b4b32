//! Storage channel
//!
//! The shared store is the only object that crosses process boundaries.
//! [`SharedStore`] is the raw string-keyed store (browser `localStorage` or
//! [`MemoryStore`]); [`StorageChannel`] layers the registry's single JSON
//! blob on top of it.

mod channel;
mod memory;

pub use channel::StorageChannel;
pub use memory::MemoryStore;

use crate::error::StoreError;

/// Synchronous, string-keyed store visible to every window of the application.
pub trait SharedStore {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every key.
    fn clear(&self) -> Result<(), StoreError>;
}
