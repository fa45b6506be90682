//! Synchronized storage: a host-provided storage area shared across the user's devices.
//!
//! Hosts expose a callback API and report failures through a "last error" field that is only
//! meaningful while the completion callback runs. [`SynchronizedBackend`] wraps each call in a
//! future once, so callers only ever see `Result`s.

use super::{StorageError, ValueBag};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

/// Total bytes a synchronized area may hold.
pub const QUOTA_BYTES: usize = 102_400;
/// Bytes a single item (key plus JSON text) may occupy.
pub const QUOTA_BYTES_PER_ITEM: usize = 8_192;
/// Number of items a synchronized area may hold.
pub const MAX_ITEMS: usize = 512;

pub type GetCallback = Box<dyn FnOnce(ValueBag) + Send>;
pub type SetCallback = Box<dyn FnOnce() + Send>;

/// Native error object reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Callback-style storage surface offered by the host.
///
/// Implementations must invoke the callback exactly once per call, and must make
/// [`StorageArea::last_error`] return the failure (if any) for the duration of that callback.
pub trait StorageArea: Send + Sync {
    /// Reads `keys`. Keys with nothing stored are left out of the bag.
    fn get(&self, keys: Vec<String>, callback: GetCallback);

    fn set(&self, items: ValueBag, callback: SetCallback);

    fn last_error(&self) -> Option<HostError>;
}

#[derive(Clone)]
pub struct SynchronizedBackend {
    area: Arc<dyn StorageArea>,
}

impl SynchronizedBackend {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self { area }
    }

    pub async fn get(&self, key: &str) -> Result<ValueBag, StorageError> {
        let (tx, rx) = oneshot::channel();
        let area = Arc::clone(&self.area);
        self.area.get(
            vec![key.to_string()],
            Box::new(move |bag| {
                let outcome = match area.last_error() {
                    Some(err) => Err(err),
                    None => Ok(bag),
                };
                let _ = tx.send(outcome);
            }),
        );

        let mut bag = rx.await.map_err(|_| StorageError::HostDropped)??;
        bag.entry(key.to_string()).or_insert(Value::Null);
        debug!(key, "synchronized get completed");
        Ok(bag)
    }

    pub async fn set(&self, bag: ValueBag) -> Result<(), StorageError> {
        let (tx, rx) = oneshot::channel();
        let area = Arc::clone(&self.area);
        let keys = bag.len();
        self.area.set(
            bag,
            Box::new(move || {
                let outcome = match area.last_error() {
                    Some(err) => Err(err),
                    None => Ok(()),
                };
                let _ = tx.send(outcome);
            }),
        );

        rx.await.map_err(|_| StorageError::HostDropped)??;
        debug!(keys, "synchronized set completed");
        Ok(())
    }
}

/// In-process [`StorageArea`] enforcing the synchronized storage quotas.
///
/// A `set` is atomic: when any quota would be exceeded nothing is written and the failure is
/// reported through `last_error`.
#[derive(Default)]
pub struct MemoryStorageArea {
    items: Mutex<ValueBag>,
    last_error: Mutex<Option<HostError>>,
}

impl MemoryStorageArea {
    pub fn with_items(items: ValueBag) -> Self {
        Self {
            items: Mutex::new(items),
            last_error: Mutex::new(None),
        }
    }

    /// Copy of everything currently stored.
    pub fn snapshot(&self) -> ValueBag {
        lock(&self.items).clone()
    }

    fn complete(&self, error: Option<HostError>, callback: impl FnOnce()) {
        *lock(&self.last_error) = error;
        callback();
        *lock(&self.last_error) = None;
    }

    fn check_quota(merged: &ValueBag, written: &ValueBag) -> Option<HostError> {
        if written.iter().any(|(key, value)| item_bytes(key, value) > QUOTA_BYTES_PER_ITEM) {
            return Some(HostError::new("QUOTA_BYTES_PER_ITEM quota exceeded"));
        }
        if merged.len() > MAX_ITEMS {
            return Some(HostError::new("MAX_ITEMS quota exceeded"));
        }
        let total: usize = merged.iter().map(|(key, value)| item_bytes(key, value)).sum();
        if total > QUOTA_BYTES {
            return Some(HostError::new("QUOTA_BYTES quota exceeded"));
        }
        None
    }
}

impl StorageArea for MemoryStorageArea {
    fn get(&self, keys: Vec<String>, callback: GetCallback) {
        let bag = {
            let items = lock(&self.items);
            keys.into_iter()
                .filter_map(|key| items.get(&key).cloned().map(|value| (key, value)))
                .collect()
        };
        self.complete(None, || callback(bag));
    }

    fn set(&self, written: ValueBag, callback: SetCallback) {
        let error = {
            let mut items = lock(&self.items);
            let mut merged = items.clone();
            merged.extend(written.clone());
            match Self::check_quota(&merged, &written) {
                Some(err) => Some(err),
                None => {
                    *items = merged;
                    None
                }
            }
        };
        self.complete(error, callback);
    }

    fn last_error(&self) -> Option<HostError> {
        lock(&self.last_error).clone()
    }
}

fn item_bytes(key: &str, value: &Value) -> usize {
    key.len() + value.to_string().len()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(entries: &[(&str, Value)]) -> ValueBag {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    /// Host that never answers.
    struct SilentArea;

    impl StorageArea for SilentArea {
        fn get(&self, _keys: Vec<String>, _callback: GetCallback) {}
        fn set(&self, _items: ValueBag, _callback: SetCallback) {}
        fn last_error(&self) -> Option<HostError> {
            None
        }
    }

    #[tokio::test]
    async fn test_get_returns_stored_value() {
        let area = MemoryStorageArea::with_items(bag(&[("prompts", json!(["x"]))]));
        let backend = SynchronizedBackend::new(Arc::new(area));

        let result = backend.get("prompts").await.unwrap();

        assert_eq!(Some(&json!(["x"])), result.get("prompts"));
    }

    #[tokio::test]
    async fn test_oversized_item_is_rejected_without_writing() {
        let area = Arc::new(MemoryStorageArea::default());
        let backend = SynchronizedBackend::new(area.clone());
        let huge = "x".repeat(QUOTA_BYTES_PER_ITEM);

        let result = backend
            .set(bag(&[("small", json!(1)), ("huge", json!(huge))]))
            .await;

        match result {
            Err(StorageError::Host(err)) => assert!(err.message.contains("QUOTA_BYTES_PER_ITEM")),
            other => panic!("Expected host error, got {:?}", other),
        }
        assert!(area.snapshot().is_empty(), "A failed set must write nothing");
        assert_eq!(None, area.last_error(), "Error is only visible inside the callback");
    }

    #[tokio::test]
    async fn test_total_quota_is_enforced() {
        let area = Arc::new(MemoryStorageArea::default());
        let backend = SynchronizedBackend::new(area.clone());
        let chunk = "y".repeat(8_000);

        let mut failed = false;
        for i in 0..20 {
            let key = format!("k{}", i);
            if let Err(StorageError::Host(err)) = backend
                .set(bag(&[(key.as_str(), json!(chunk.as_str()))]))
                .await
            {
                assert_eq!("QUOTA_BYTES quota exceeded", err.message);
                failed = true;
                break;
            }
        }

        assert!(failed, "Expected the total quota to be hit");
        let total: usize = area
            .snapshot()
            .iter()
            .map(|(key, value)| item_bytes(key, value))
            .sum();
        assert!(total <= QUOTA_BYTES);
    }

    #[tokio::test]
    async fn test_dropped_callback_is_reported() {
        let backend = SynchronizedBackend::new(Arc::new(SilentArea));

        let result = backend.get("prompts").await;

        assert!(matches!(result, Err(StorageError::HostDropped)));
    }
}
