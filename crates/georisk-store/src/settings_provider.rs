use std::sync::Mutex;

use georisk_models::ScoringSettings;

use crate::sqlite::SqliteStore;

/// Exposes `get_active_settings()`, memoized until `invalidate()` is
/// called, backed by the same read-through shape as `CorpusReader` (§4.1).
///
/// Resolution order: persisted record named "default" and active; else
/// any active persisted record; else the built-in defaults. Construction
/// of the defaults cannot fail, so this handle never returns an error.
pub struct SettingsProvider {
    store: Mutex<SqliteStore>,
    memo: Mutex<Option<ScoringSettings>>,
}

impl SettingsProvider {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Mutex::new(store),
            memo: Mutex::new(None),
        }
    }

    pub fn get_active_settings(&self) -> ScoringSettings {
        if let Ok(guard) = self.memo.lock() {
            if let Some(settings) = guard.clone() {
                return settings;
            }
        }

        let resolved = self
            .store
            .lock()
            .ok()
            .and_then(|store| store.load_active_settings().ok())
            .flatten()
            .unwrap_or_default();

        if let Ok(mut guard) = self.memo.lock() {
            *guard = Some(resolved.clone());
        }
        resolved
    }

    /// Drops the memoized value so the next call re-reads the store. A
    /// poisoned memo is treated the same as an absent one.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.memo.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_defaults_when_store_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let provider = SettingsProvider::new(store);
        let settings = provider.get_active_settings();
        assert_eq!(settings.decay_constant, 30.0);
    }

    #[test]
    fn memoizes_until_invalidated() {
        let store = SqliteStore::open_in_memory().unwrap();
        let provider = SettingsProvider::new(store);

        let first = provider.get_active_settings();
        let second = provider.get_active_settings();
        assert_eq!(first, second);

        provider.invalidate();
        let third = provider.get_active_settings();
        assert_eq!(first, third);
    }
}
