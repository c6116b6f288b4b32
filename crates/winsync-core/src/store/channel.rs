//! JSON blob adapter over a [`SharedStore`].

use super::SharedStore;
use crate::error::StoreError;
use crate::types::RegistryState;

/// Suffix of the registry key; the namespace is prepended.
const REGISTRY_KEY_SUFFIX: &str = "windows";

/// Reads and writes the registry blob under one namespaced key.
#[derive(Debug)]
pub struct StorageChannel<S> {
    store: S,
    key: String,
}

impl<S: SharedStore> StorageChannel<S> {
    /// Create a channel for `namespace`.
    ///
    /// Applications sharing an origin must use different namespaces.
    pub fn new(store: S, namespace: &str) -> Self {
        Self {
            store,
            key: format!("{}:{}", namespace, REGISTRY_KEY_SUFFIX),
        }
    }

    /// Key the blob is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current state.
    ///
    /// An absent key and a value that fails to parse both read as `None`;
    /// only an unreachable store is an error.
    pub fn read(&self) -> Result<Option<RegistryState>, StoreError> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            return Ok(None);
        };

        match serde_json::from_str::<RegistryState>(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding corrupt registry blob");
                Ok(None)
            }
        }
    }

    /// Replace the stored state with `state`.
    pub fn write(&self, state: &RegistryState) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(state).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set_item(&self.key, &json)
    }

    /// Remove the registry blob only.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove_item(&self.key)
    }

    /// Wipe the entire store. Used to recover from a bad session.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{Metadata, Shape, WindowDescriptor, WindowId};

    fn sample_state() -> RegistryState {
        let id = WindowId::generate();
        let desc = WindowDescriptor::new(id, Shape::new(0.0, 0.0, 640.0, 480.0), Metadata::new(), 10);
        RegistryState::new(id, vec![desc])
    }

    #[test]
    fn test_key_is_namespaced() {
        let channel = StorageChannel::new(MemoryStore::new(), "demo");
        assert_eq!(channel.key(), "demo:windows");
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        let channel = StorageChannel::new(store.clone(), "demo");
        let state = sample_state();

        channel.write(&state).unwrap();
        assert!(store.peek("demo:windows").is_some());
        assert_eq!(channel.read().unwrap(), Some(state));
    }

    #[test]
    fn test_absent_and_corrupt_read_as_empty() {
        let store = MemoryStore::new();
        let channel = StorageChannel::new(store.clone(), "demo");
        assert_eq!(channel.read().unwrap(), None);

        store.put_raw("demo:windows", "{not json");
        assert_eq!(channel.read().unwrap(), None);

        store.put_raw("demo:windows", r#"{"windows": [{"id": 3}]}"#);
        assert_eq!(channel.read().unwrap(), None);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryStore::new();
        let a = StorageChannel::new(store.clone(), "app-a");
        let b = StorageChannel::new(store.clone(), "app-b");

        a.write(&sample_state()).unwrap();
        assert!(a.read().unwrap().is_some());
        assert_eq!(b.read().unwrap(), None);
    }

    #[test]
    fn test_unavailable_store_is_an_error() {
        let store = MemoryStore::new();
        let channel = StorageChannel::new(store.clone(), "demo");
        store.set_available(false);

        assert!(channel.read().is_err());
        assert!(channel.write(&sample_state()).is_err());
    }

    #[test]
    fn test_clear_and_reset() {
        let store = MemoryStore::new();
        let channel = StorageChannel::new(store.clone(), "demo");
        store.put_raw("other", "1");
        channel.write(&sample_state()).unwrap();

        channel.clear().unwrap();
        assert_eq!(channel.read().unwrap(), None);
        assert_eq!(store.peek("other").as_deref(), Some("1"));

        channel.write(&sample_state()).unwrap();
        channel.reset().unwrap();
        assert!(store.is_empty());
    }
}
