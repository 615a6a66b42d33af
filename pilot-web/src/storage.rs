//! `localStorage` backend for the profile repository.

use pilot_engine::KeyValueStore;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::dom::{js_error_message, local_storage};

#[derive(Debug, thiserror::Error)]
pub enum WebStoreError {
    #[error("localStorage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl WebStoreError {
    fn storage(value: &JsValue) -> Self {
        Self::Storage(js_error_message(value))
    }
}

/// Profile storage in the browser's `localStorage`.
#[derive(Debug, Clone)]
pub struct WebStore {
    storage: Storage,
}

impl WebStore {
    /// Open the page's `localStorage`.
    ///
    /// # Errors
    /// Returns an error when storage is disabled or there is no window.
    pub fn local() -> Result<Self, WebStoreError> {
        local_storage()
            .map(|storage| Self { storage })
            .map_err(|err| WebStoreError::Unavailable(js_error_message(&err)))
    }
}

impl KeyValueStore for WebStore {
    type Error = WebStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        self.storage
            .get_item(key)
            .map_err(|err| WebStoreError::storage(&err))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.storage
            .set_item(key, value)
            .map_err(|err| WebStoreError::storage(&err))
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.storage
            .remove_item(key)
            .map_err(|err| WebStoreError::storage(&err))
    }
}

