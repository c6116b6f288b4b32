//! `localStorage` backend for the registry.
//!
//! Browsers can refuse storage outright (privacy modes, user settings) or
//! throw on write when the origin's quota is full. Both surface as
//! [`StoreError`]s, which the registry turns into single-window mode.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, Storage};
use winsync_core::{SharedStore, StoreError};

/// [`SharedStore`] over the page's `window.localStorage`.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    /// Open the current window's local storage.
    ///
    /// Never fails: a missing or refused storage yields a store whose every
    /// operation reports `Unavailable`.
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StoreError::unavailable("localStorage is not available"))
    }
}

fn js_error(op: &str, e: JsValue) -> StoreError {
    StoreError::unavailable(format!("{} failed: {:?}", op, e))
}

/// Exception names browsers use for a full origin quota.
pub(crate) fn is_quota_exceeded(name: &str) -> bool {
    matches!(name, "QuotaExceededError" | "NS_ERROR_DOM_QUOTA_REACHED")
}

fn set_item_error(e: JsValue) -> StoreError {
    let quota = e
        .dyn_ref::<DomException>()
        .is_some_and(|ex| is_quota_exceeded(&ex.name()));
    if quota {
        StoreError::QuotaExceeded
    } else {
        js_error("setItem", e)
    }
}

impl SharedStore for LocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| js_error("getItem", e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(set_item_error)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| js_error("removeItem", e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.storage()?.clear().map_err(|e| js_error("clear", e))
    }
}
