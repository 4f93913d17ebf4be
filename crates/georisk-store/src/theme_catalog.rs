use std::sync::Mutex;

use georisk_models::theme::{default_catalog, ThemeDefinition};

use crate::sqlite::SqliteStore;

/// Exposes `list_active_themes()`: persisted catalog when non-empty,
/// otherwise the built-in eight-theme default (§4.2).
pub struct ThemeCatalog {
    store: Mutex<SqliteStore>,
}

impl ThemeCatalog {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub fn list_active_themes(&self) -> Vec<ThemeDefinition> {
        let persisted = self
            .store
            .lock()
            .ok()
            .and_then(|store| store.load_active_themes().ok())
            .unwrap_or_default();

        if persisted.is_empty() {
            default_catalog()
        } else {
            persisted
        }
    }

    /// Seeds the built-in catalog into the backing store if it is empty,
    /// so a freshly-provisioned process has an active catalog at rest.
    pub fn seed_if_empty(&self) {
        if let Ok(store) = self.store.lock() {
            let _ = store.seed_default_themes_if_empty();
        }
    }
}
