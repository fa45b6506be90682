use crate::constants::PROMPTDECK_CLI;
use confy::ConfyError;
use promptdeck_core::config::{BackendPreference, StoreConfig};
use promptdeck_core::locale::LocaleProvider;
use promptdeck_core::store::PromptStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptdeckCliConfig {
    pub store: StoreConfig,
    /// Copy rendered prompts to the clipboard instead of printing them.
    pub copy_to_clipboard: bool,
}

impl PromptdeckCliConfig {
    fn apply_overrides(&mut self, storage_path: Option<String>, locale: Option<String>) {
        if let Some(path) = storage_path {
            self.store.local_path = PathBuf::from(path);
            self.store.backend = BackendPreference::Local;
        }
        if locale.is_some() {
            self.store.locale = locale;
        }
    }
}

pub fn load_config(storage_path: Option<String>, locale: Option<String>) -> PromptdeckCliConfig {
    let config: Result<PromptdeckCliConfig, ConfyError> = confy::load(PROMPTDECK_CLI, None);
    match config {
        Ok(mut config) => {
            config.apply_overrides(storage_path, locale);
            config
        }
        Err(err) => {
            eprintln!("Error: Problem loading config ({}). Exiting...", err);
            std::process::exit(exitcode::CONFIG);
        }
    }
}

pub fn initialize_store(config: &StoreConfig, locale: Arc<dyn LocaleProvider>) -> PromptStore {
    // A terminal has no host storage area to offer.
    PromptStore::new(config.backend(None), locale)
}
