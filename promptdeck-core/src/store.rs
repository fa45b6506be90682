//! # Prompt Store
//!
//! Owns the in-memory mirror of the prompt list and loads it from a [`StorageBackend`] exactly
//! once per store.
//!
//! Loading moves through [`LoadState::Unloaded`], [`LoadState::Loading`] and
//! [`LoadState::Loaded`]. On the very first use of a backend (no usage marker, no stored
//! prompts) it seeds the default prompts for the current locale and records the marker in the
//! same write. A failed load is logged, leaves the store not loaded, and may be retried.
//!
//! # Examples
//!
//! ```rust
//! use promptdeck_core::locale::FixedLocale;
//! use promptdeck_core::storage::{MemoryTextStore, StorageBackend};
//! use promptdeck_core::store::PromptStore;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let backend = StorageBackend::select(None, Arc::new(MemoryTextStore::default()));
//! let store = PromptStore::new(backend, Arc::new(FixedLocale::new("en-US")));
//!
//! store.load_prompts().await;
//! assert!(store.is_loaded());
//! assert_eq!(3, store.prompts().len());
//! # });
//! ```

use crate::defaults::DefaultBucket;
use crate::locale::LocaleProvider;
use crate::storage::{
    BackendKind, HAS_USED_BEFORE_KEY, PROMPTS_KEY, StorageBackend, StorageError, ValueBag,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("prompts are not loaded")]
    NotLoaded,
    #[error("no prompt at index {index}, the list has {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Handle to a prompt store. Clones share the same mirror and backend.
#[derive(Clone)]
pub struct PromptStore {
    inner: Arc<Inner>,
}

struct Inner {
    backend: StorageBackend,
    locale: Arc<dyn LocaleProvider>,
    prompts: watch::Sender<Vec<String>>,
    state: watch::Sender<LoadState>,
    // Held for the whole of a load, so concurrent callers wait instead of seeding twice.
    load_gate: Mutex<()>,
    // Serializes read-modify-write of the prompt list.
    write_gate: Mutex<()>,
}

impl PromptStore {
    /// Creates an unloaded store.
    pub fn new(backend: StorageBackend, locale: Arc<dyn LocaleProvider>) -> Self {
        let (prompts, _) = watch::channel(Vec::new());
        let (state, _) = watch::channel(LoadState::Unloaded);
        Self {
            inner: Arc::new(Inner {
                backend,
                locale,
                prompts,
                state,
                load_gate: Mutex::new(()),
                write_gate: Mutex::new(()),
            }),
        }
    }

    /// Creates a store and starts loading it in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(backend: StorageBackend, locale: Arc<dyn LocaleProvider>) -> Self {
        let store = Self::new(backend, locale);
        let loader = store.clone();
        tokio::spawn(async move { loader.load_prompts().await });
        store
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.inner.backend.kind()
    }

    pub fn state(&self) -> LoadState {
        *self.inner.state.borrow()
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }

    /// Current contents of the mirror.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.prompts.borrow().clone()
    }

    /// Receiver notified every time the mirror changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.inner.prompts.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LoadState> {
        self.inner.state.subscribe()
    }

    /// Resolves once the store is loaded. Never resolves if every load attempt fails.
    pub async fn wait_until_loaded(&self) {
        let mut state = self.subscribe_state();
        let _ = state.wait_for(|state| *state == LoadState::Loaded).await;
    }

    /// Reads `key` straight from the backend. The mirror is not touched.
    pub async fn get(&self, key: &str) -> Result<ValueBag, StorageError> {
        self.inner.backend.get(key).await
    }

    /// Writes `bag` straight to the backend. The mirror is not touched; use
    /// [`PromptStore::save_prompts`] to persist and publish a list together.
    pub async fn set(&self, bag: ValueBag) -> Result<(), StorageError> {
        self.inner.backend.set(bag).await
    }

    /// Loads the prompt list into the mirror, seeding defaults on first use.
    ///
    /// A no-op once loaded. A call made while another load is in flight waits for it and then
    /// returns without touching the backend. Errors are logged and never returned.
    pub async fn load_prompts(&self) {
        if self.is_loaded() {
            return;
        }
        let _gate = self.inner.load_gate.lock().await;
        if self.is_loaded() {
            return;
        }

        self.inner.state.send_replace(LoadState::Loading);
        match self.fetch_or_seed().await {
            Ok(prompts) => {
                self.inner.prompts.send_replace(prompts);
                self.inner.state.send_replace(LoadState::Loaded);
            }
            Err(err) => error!(error = %err, "failed to load prompts"),
        }
    }

    async fn fetch_or_seed(&self) -> Result<Vec<String>, StorageError> {
        let backend = &self.inner.backend;
        let (marker, stored) =
            tokio::try_join!(backend.get(HAS_USED_BEFORE_KEY), backend.get(PROMPTS_KEY))?;

        let has_used_before = marker
            .get(HAS_USED_BEFORE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let stored = stored.get(PROMPTS_KEY).cloned().unwrap_or(Value::Null);

        if !has_used_before && is_empty_list(&stored) {
            return self.seed_defaults().await;
        }
        Ok(normalize_prompts(stored))
    }

    async fn seed_defaults(&self) -> Result<Vec<String>, StorageError> {
        let locale = self.inner.locale.locale();
        let bucket = DefaultBucket::for_locale(&locale);
        let defaults = bucket.prompts();
        info!(%locale, ?bucket, "first use, seeding default prompts");

        let mut bag = ValueBag::new();
        bag.insert(PROMPTS_KEY.to_string(), Value::from(defaults.clone()));
        bag.insert(HAS_USED_BEFORE_KEY.to_string(), Value::Bool(true));
        self.inner.backend.set(bag).await?;
        Ok(defaults)
    }

    /// Replaces the whole list, persisting it before publishing it on the mirror.
    pub async fn save_prompts(&self, prompts: Vec<String>) -> Result<(), StoreError> {
        self.modify(|current| {
            *current = prompts;
            Ok(())
        })
        .await
    }

    /// Appends a prompt and returns its index.
    pub async fn add_prompt(&self, prompt: impl Into<String>) -> Result<usize, StoreError> {
        let prompt = prompt.into();
        self.modify(|prompts| {
            prompts.push(prompt);
            Ok(prompts.len() - 1)
        })
        .await
    }

    pub async fn update_prompt(
        &self,
        index: usize,
        prompt: impl Into<String>,
    ) -> Result<(), StoreError> {
        let prompt = prompt.into();
        self.modify(|prompts| {
            let len = prompts.len();
            let slot = prompts
                .get_mut(index)
                .ok_or(StoreError::IndexOutOfRange { index, len })?;
            *slot = prompt;
            Ok(())
        })
        .await
    }

    /// Removes the prompt at `index` and returns it.
    pub async fn remove_prompt(&self, index: usize) -> Result<String, StoreError> {
        self.modify(|prompts| {
            check_index(prompts, index)?;
            Ok(prompts.remove(index))
        })
        .await
    }

    /// Moves the prompt at `from` so that it ends up at `to`.
    pub async fn move_prompt(&self, from: usize, to: usize) -> Result<(), StoreError> {
        self.modify(|prompts| {
            check_index(prompts, from)?;
            check_index(prompts, to)?;
            let prompt = prompts.remove(from);
            prompts.insert(to, prompt);
            Ok(())
        })
        .await
    }

    /// Replaces the list with the default prompts of the current locale.
    pub async fn restore_defaults(&self) -> Result<Vec<String>, StoreError> {
        let defaults = DefaultBucket::for_locale(&self.inner.locale.locale()).prompts();
        self.save_prompts(defaults.clone()).await?;
        Ok(defaults)
    }

    async fn modify<T>(
        &self,
        edit: impl FnOnce(&mut Vec<String>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        // Editing an unloaded mirror would overwrite whatever is persisted.
        self.load_prompts().await;
        if !self.is_loaded() {
            return Err(StoreError::NotLoaded);
        }

        let _gate = self.inner.write_gate.lock().await;
        let mut prompts = self.prompts();
        let result = edit(&mut prompts)?;

        let mut bag = ValueBag::new();
        bag.insert(PROMPTS_KEY.to_string(), Value::from(prompts.clone()));
        self.inner.backend.set(bag).await?;
        self.inner.prompts.send_replace(prompts);
        Ok(result)
    }
}

fn check_index(prompts: &[String], index: usize) -> Result<(), StoreError> {
    if index >= prompts.len() {
        return Err(StoreError::IndexOutOfRange {
            index,
            len: prompts.len(),
        });
    }
    Ok(())
}

/// `true` for `null`, `[]` and the falsy scalars `false`, `0` and `""`.
fn is_empty_list(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// Turns whatever is stored under `prompts` into an ordered list.
///
/// Older installs may hold an object keyed by position instead of an array. Its values are
/// taken in JavaScript property order: array-index keys ascending, then the remaining keys in
/// insertion order.
pub fn normalize_prompts(stored: Value) -> Vec<String> {
    match stored {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(prompt_text).collect(),
        Value::Object(map) => {
            warn!(entries = map.len(), "converting object-shaped prompts to a list");
            let (mut indexed, named): (Vec<_>, Vec<_>) = map
                .into_iter()
                .map(|(key, value)| (array_index(&key), value))
                .partition(|(index, _)| index.is_some());
            indexed.sort_by_key(|(index, _)| *index);
            indexed
                .into_iter()
                .chain(named)
                .map(|(_, value)| prompt_text(value))
                .collect()
        }
        Value::String(prompt) if prompt.is_empty() => Vec::new(),
        Value::String(prompt) => vec![prompt],
        other => {
            warn!(value = %other, "ignoring prompts value that is not a list");
            Vec::new()
        }
    }
}

fn prompt_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// `Some(n)` when `key` is the canonical decimal form of an array index.
fn array_index(key: &str) -> Option<u32> {
    let index: u32 = key.parse().ok()?;
    (index != u32::MAX && index.to_string() == key).then_some(index)
}
