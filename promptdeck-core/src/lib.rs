//! # promptdeck Core
//!
//! This crate provides the core functionality for promptdeck, a manager for a list of reusable
//! text prompts.
//!
//! The prompt list lives in a key-value store that is either synchronized by the host across
//! devices or kept locally as a fallback. On the first ever use, locale-appropriate sample
//! prompts are seeded exactly once.
//!
//! # Modules
//!
//! - [`config`] - Store configuration and backend selection
//! - [`defaults`] - Sample prompts per locale bucket
//! - [`file_storage`] - File-based local fallback storage
//! - [`locale`] - Locale provider and message catalogs
//! - [`placeholders`] - `{name}` placeholder parsing and rendering
//! - [`storage`] - Storage backends and their common contract
//! - [`store`] - The prompt store and its load state machine
//!
//! # Examples
//!
//! ```rust
//! use promptdeck_core::file_storage::FileTextStore;
//! use promptdeck_core::locale::FixedLocale;
//! use promptdeck_core::storage::StorageBackend;
//! use promptdeck_core::store::PromptStore;
//! use std::sync::Arc;
//! use tempfile::TempDir;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let temp_dir = TempDir::new().unwrap();
//! let fallback = Arc::new(FileTextStore::new(temp_dir.path().to_path_buf()));
//! let store = PromptStore::new(
//!     StorageBackend::select(None, fallback),
//!     Arc::new(FixedLocale::new("ko-KR")),
//! );
//!
//! store.load_prompts().await;
//! store.add_prompt("Summarize {topic} in three bullet points").await.expect("Failed to add prompt");
//! assert_eq!(4, store.prompts().len());
//! # });
//! ```

pub mod config;
pub mod defaults;
pub mod file_storage;
pub mod locale;
pub mod placeholders;
pub mod storage;
pub mod store;
