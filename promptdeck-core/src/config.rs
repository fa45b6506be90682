//! Store configuration.

use crate::file_storage::FileTextStore;
use crate::locale::system_locale;
use crate::storage::{StorageArea, StorageBackend};
use serde::{Deserialize, Serialize};
use std::env::home_dir;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Synchronized when the host offers a storage area, local otherwise.
    #[default]
    Auto,
    Synchronized,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendPreference,
    /// Directory of the file-backed local fallback.
    pub local_path: PathBuf,
    /// Overrides the locale reported by the environment.
    pub locale: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let local_path = home_dir()
            .map(|p| p.join(".promptdeck").join("storage"))
            .unwrap_or_else(|| PathBuf::from("promptdeck/storage"));

        Self {
            backend: BackendPreference::default(),
            local_path,
            locale: None,
        }
    }
}

impl StoreConfig {
    /// Chooses the backend once, from the preference and the host's capabilities.
    pub fn backend(&self, host: Option<Arc<dyn StorageArea>>) -> StorageBackend {
        let fallback = Arc::new(FileTextStore::new(self.local_path.clone()));
        let host = match self.backend {
            BackendPreference::Auto => host,
            BackendPreference::Synchronized => {
                if host.is_none() {
                    warn!("synchronized storage requested but unavailable, using local storage");
                }
                host
            }
            BackendPreference::Local => None,
        };
        StorageBackend::select(host, fallback)
    }

    pub fn resolve_locale(&self) -> String {
        self.locale.clone().unwrap_or_else(system_locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BackendKind, MemoryStorageArea};

    fn host() -> Option<Arc<dyn StorageArea>> {
        Some(Arc::new(MemoryStorageArea::default()))
    }

    #[test]
    fn test_backend_selection() {
        let auto = StoreConfig::default();
        assert_eq!(BackendKind::Synchronized, auto.backend(host()).kind());
        assert_eq!(BackendKind::Local, auto.backend(None).kind());

        let local = StoreConfig {
            backend: BackendPreference::Local,
            ..StoreConfig::default()
        };
        assert_eq!(BackendKind::Local, local.backend(host()).kind());

        let synchronized = StoreConfig {
            backend: BackendPreference::Synchronized,
            ..StoreConfig::default()
        };
        assert_eq!(BackendKind::Local, synchronized.backend(None).kind());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"backend": "local"}"#).unwrap();

        assert_eq!(BackendPreference::Local, config.backend);
        assert_eq!(StoreConfig::default().local_path, config.local_path);
        assert_eq!(None, config.locale);
    }

    #[test]
    fn test_locale_override() {
        let config = StoreConfig {
            locale: Some("en-GB".to_string()),
            ..StoreConfig::default()
        };
        assert_eq!("en-GB", config.resolve_locale());
    }
}
