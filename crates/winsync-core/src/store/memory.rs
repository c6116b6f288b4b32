//! In-memory store for tests and native hosts.
//!
//! Cloning a `MemoryStore` yields another handle onto the same map, which is
//! how simulated processes share one store.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::SharedStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<String, String>,
    /// When false every operation fails with `Unavailable`
    disabled: bool,
    /// Maximum total bytes of keys + values
    quota: Option<usize>,
    writes: u64,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.disabled {
            Err(StoreError::unavailable("store disabled"))
        } else {
            Ok(())
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

/// Shared in-memory key-value store with fault injection.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store being disabled (or re-enabled) by the user.
    pub fn set_available(&self, available: bool) {
        self.inner.borrow_mut().disabled = !available;
    }

    /// Limit the total stored bytes. `None` removes the limit.
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.inner.borrow_mut().quota = bytes;
    }

    /// Write a raw value, bypassing availability and quota checks.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .items
            .insert(key.to_owned(), value.to_owned());
    }

    /// Read a raw value, bypassing availability checks.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> u64 {
        self.inner.borrow().writes
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }
}

impl SharedStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.borrow();
        inner.check_available()?;
        Ok(inner.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_available()?;

        if let Some(quota) = inner.quota {
            if inner.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(StoreError::QuotaExceeded);
            }
        }

        inner.items.insert(key.to_owned(), value.to_owned());
        inner.writes += 1;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_available()?;
        inner.items.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_available()?;
        inner.items.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_items() {
        let a = MemoryStore::new();
        let b = a.clone();

        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));

        b.remove_item("k").unwrap();
        assert_eq!(a.get_item("k").unwrap(), None);
        // Removing again is fine
        b.remove_item("k").unwrap();
    }

    #[test]
    fn test_disabled_store_fails() {
        let store = MemoryStore::new();
        store.set_item("k", "v").unwrap();
        store.set_available(false);

        assert!(matches!(store.get_item("k"), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.set_item("k", "w"), Err(StoreError::Unavailable(_))));
        assert!(store.clear().is_err());

        store.set_available(true);
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_quota() {
        let store = MemoryStore::new();
        store.set_quota(Some(10));

        store.set_item("ab", "12345678").unwrap();
        // Replacing the same key only counts the new value
        store.set_item("ab", "87654321").unwrap();
        assert_eq!(store.set_item("c", "x"), Err(StoreError::QuotaExceeded));
        assert_eq!(store.write_count(), 2);

        store.set_quota(None);
        store.set_item("c", "x").unwrap();
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        store.set_item("a", "1").unwrap();
        store.put_raw("b", "2");

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.peek("b"), None);
    }
}
