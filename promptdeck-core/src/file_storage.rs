//! # File Storage
//!
//! A [`TextStore`] on the local filesystem, used as the local fallback when no host storage
//! area is available.
//!
//! Every key is stored as its own `<key>.json` file in a base directory. Writes go through a
//! temporary file in the same directory and are renamed into place, so a reader never sees a
//! half-written value.
//!
//! # Examples
//!
//! ```rust
//! use promptdeck_core::file_storage::FileTextStore;
//! use promptdeck_core::storage::TextStore;
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let store = FileTextStore::new(temp_dir.path().join("storage"));
//!
//! store.set_item("prompts", "[\"hello\"]").expect("Failed to write item");
//! assert_eq!(Some("[\"hello\"]".to_string()), store.get_item("prompts").unwrap());
//! ```

use crate::storage::{StorageError, TextStore};
use std::fs::{self, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A local file storage for text values.
pub struct FileTextStore {
    /// The base directory where value files are stored.
    pub base_path: PathBuf,
}

impl FileTextStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Creates `base_path` if needed.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If `base_path` exists and is a directory.
    /// * `StorageError::InvalidBasePath` - If `base_path` exists but is not a directory.
    pub fn ensure_base_directory_exists(&self) -> Result<(), StorageError> {
        if !self.base_path.exists() {
            create_dir_all(&self.base_path)?;
        } else if !self.base_path.is_dir() {
            return Err(StorageError::InvalidBasePath(
                self.base_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && !key.contains(['/', '\\', '\0']);
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

impl TextStore for FileTextStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let file_path = self.key_path(key)?;
        if !file_path.exists() {
            return Ok(None);
        }
        let text = String::from_utf8(fs::read(file_path)?).map_err(|source| {
            StorageError::MalformedValue {
                key: key.to_string(),
                source: source.into(),
            }
        })?;
        Ok(Some(text))
    }

    /// Saves `value` under `key`, overwriting any previous value.
    ///
    /// If `base_path` doesn't exist, it is created first.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let file_path = self.key_path(key)?;
        self.ensure_base_directory_exists()?;

        let mut file = NamedTempFile::new_in(&self.base_path)?;
        file.write_all(value.as_bytes())?;
        file.persist(file_path).map_err(|err| err.error)?;
        Ok(())
    }
}
