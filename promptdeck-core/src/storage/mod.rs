//! # Storage
//!
//! Key-value persistence behind the prompt store.
//!
//! Two backends share one contract: [`StorageBackend::get`] returns a [`ValueBag`] holding the
//! requested key (`null` when nothing is stored) and [`StorageBackend::set`] persists every key
//! of a bag.
//!
//! - [`SynchronizedBackend`] adapts a host-provided, callback-style [`StorageArea`].
//! - [`LocalBackend`] adapts a synchronous text store ([`TextStore`]) where every value is
//!   serialized to JSON independently.
//!
//! The backend is chosen once, by [`StorageBackend::select`], and never re-probed.

mod local;
mod synchronized;

pub use local::{LocalBackend, MemoryTextStore, TextStore};
pub use synchronized::{
    GetCallback, HostError, MAX_ITEMS, MemoryStorageArea, QUOTA_BYTES, QUOTA_BYTES_PER_ITEM,
    SetCallback, StorageArea, SynchronizedBackend,
};

use serde_json::{Map, Value};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Unit of exchange with a backend: key to JSON value.
pub type ValueBag = Map<String, Value>;

/// Marker recording that first-use initialization has completed.
pub const HAS_USED_BEFORE_KEY: &str = "hasUsedBefore";

/// Ordered list of prompt strings.
pub const PROMPTS_KEY: &str = "prompts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("host storage error: {0}")]
    Host(#[from] HostError),
    #[error("host storage dropped the request without completing it")]
    HostDropped,
    #[error("malformed value stored under '{key}': {source}")]
    MalformedValue {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("cannot serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("invalid base path: {0}")]
    InvalidBasePath(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Synchronized,
    Local,
}

/// The backend a store talks to for its whole lifetime.
#[derive(Clone)]
pub enum StorageBackend {
    Synchronized(SynchronizedBackend),
    Local(LocalBackend),
}

impl StorageBackend {
    /// Picks the synchronized backend when the host offers a storage area, the local fallback
    /// otherwise.
    pub fn select(host: Option<Arc<dyn StorageArea>>, fallback: Arc<dyn TextStore>) -> Self {
        match host {
            Some(area) => {
                debug!("host storage area available, using synchronized backend");
                StorageBackend::Synchronized(SynchronizedBackend::new(area))
            }
            None => {
                debug!("host storage area unavailable, using local backend");
                StorageBackend::Local(LocalBackend::new(fallback))
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            StorageBackend::Synchronized(_) => BackendKind::Synchronized,
            StorageBackend::Local(_) => BackendKind::Local,
        }
    }

    /// Reads one key. A missing key comes back as `null` rather than an error.
    pub async fn get(&self, key: &str) -> Result<ValueBag, StorageError> {
        match self {
            StorageBackend::Synchronized(backend) => backend.get(key).await,
            StorageBackend::Local(backend) => backend.get(key).await,
        }
    }

    /// Persists every key of `bag`.
    pub async fn set(&self, bag: ValueBag) -> Result<(), StorageError> {
        match self {
            StorageBackend::Synchronized(backend) => backend.set(bag).await,
            StorageBackend::Local(backend) => backend.set(bag).await,
        }
    }
}
