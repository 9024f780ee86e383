//! Shared application state handed to every actix worker.
//!
//! `AppState` is built once in `main.rs` from the `Config` and registered as
//! `web::Data`. Handlers take what they need from it instead of reading
//! process-wide constants, so tests can point a whole app at a temporary
//! directory.

use crate::config::{AnnexConfig, Config, StorageConfig};
use crate::store::ServidorStore;

#[derive(Debug, Clone)]
pub struct AppState {
    /// The roster table.
    pub store: ServidorStore,
    /// Upload directory and accepted photo extensions.
    pub storage: StorageConfig,
    pub annex: AnnexConfig,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            store: ServidorStore::new(&config.storage.database_path),
            storage: config.storage.clone(),
            annex: config.annex.clone(),
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn from_storage(storage: StorageConfig) -> Self {
        AppState {
            store: ServidorStore::new(&storage.database_path),
            storage,
            annex: AnnexConfig::default(),
        }
    }
}
