//! Local storage: a single-device fallback over a synchronous text store.

use super::{StorageError, ValueBag};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// A synchronous string-keyed store where every value is kept as text.
pub trait TextStore: Send + Sync {
    /// Returns the stored text, or `None` when nothing is stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryTextStore {
    items: Mutex<HashMap<String, String>>,
}

impl TextStore for MemoryTextStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Backend that serializes each value to JSON text on write and parses it back on read.
#[derive(Clone)]
pub struct LocalBackend {
    store: Arc<dyn TextStore>,
}

impl LocalBackend {
    pub fn new(store: Arc<dyn TextStore>) -> Self {
        Self { store }
    }

    /// Absent keys parse as `null`.
    pub async fn get(&self, key: &str) -> Result<ValueBag, StorageError> {
        let text = self.store.get_item(key)?;
        let value: Value = serde_json::from_str(text.as_deref().unwrap_or("null")).map_err(
            |source| StorageError::MalformedValue {
                key: key.to_string(),
                source: source.into(),
            },
        )?;

        let mut bag = ValueBag::new();
        bag.insert(key.to_string(), value);
        Ok(bag)
    }

    /// Writes key by key. The first failing key aborts the call; keys before it stay written.
    pub async fn set(&self, bag: ValueBag) -> Result<(), StorageError> {
        for (key, value) in &bag {
            let text = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
                key: key.clone(),
                source,
            })?;
            self.store.set_item(key, &text)?;
            debug!(key = key.as_str(), "local set completed");
        }
        Ok(())
    }
}
