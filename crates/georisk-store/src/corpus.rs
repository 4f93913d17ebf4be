use std::sync::Mutex;

use georisk_models::asset_profile::AssetProfile;
use georisk_models::signal::RawSignal;

use crate::sqlite::SqliteStore;

/// Read-only view over the signal corpus (§4.6).
///
/// Both operations are resilient: a persistence failure is logged at
/// `warn` and surfaces as an empty result, never as an error, because
/// losing the corpus must degrade the pipeline's intelligence quality,
/// not abort it.
///
/// SQLite access is synchronized via `Mutex` since `rusqlite::Connection`
/// is not `Sync`.
pub struct CorpusReader {
    store: Mutex<SqliteStore>,
}

impl CorpusReader {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// §4.6 `queryGlobalItems`: country-overlap filtered, fallback to
    /// unfiltered, capped and ordered inside the store layer.
    pub fn query_global_items(&self, profile: &AssetProfile) -> Vec<RawSignal> {
        let countries = profile_countries(profile);
        let result = self
            .store
            .lock()
            .map_err(|e| format!("sqlite mutex poisoned: {e}"))
            .and_then(|store| store.query_global_items(&countries).map_err(|e| e.to_string()));

        match result {
            Ok(signals) => signals,
            Err(error) => {
                tracing::warn!(error = %error, "corpus query_global_items failed; returning empty");
                Vec::new()
            }
        }
    }

    /// §4.6 `querySnapshots`: activity-filtered, country-substring
    /// filtered with relaxation, capped inside the store layer.
    pub fn query_snapshots(&self, profile: &AssetProfile, max_events_per_snapshot: usize) -> Vec<RawSignal> {
        let result = self
            .store
            .lock()
            .map_err(|e| format!("sqlite mutex poisoned: {e}"))
            .and_then(|store| {
                store
                    .query_snapshots(profile.country.as_deref(), max_events_per_snapshot)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(signals) => signals,
            Err(error) => {
                tracing::warn!(error = %error, "corpus query_snapshots failed; returning empty");
                Vec::new()
            }
        }
    }
}

fn profile_countries(profile: &AssetProfile) -> Vec<String> {
    profile.country.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use georisk_models::holding::Holding;
    use crate::sqlite::SqliteStore;

    fn profile() -> AssetProfile {
        AssetProfile::from_holding(&Holding {
            id: uuid::Uuid::nil(),
            name: "Test".to_string(),
            ticker: None,
            isin: None,
            country: Some("Russia".to_string()),
            region: "Europe".to_string(),
            sub_region: None,
            sector: "Energy".to_string(),
            asset_class: "Equity".to_string(),
            asset_type: "ETF".to_string(),
            value: 1.0,
            allocation_pct: 1.0,
            currency: "USD".to_string(),
        })
    }

    #[test]
    fn query_global_items_returns_matching_signals() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_global_item(
                "1",
                "Russia sanctions widen",
                "Summary.",
                "sanctions",
                "https://reuters.com/a",
                "2026-07-20",
                &["Russia"],
            )
            .unwrap();
        let reader = CorpusReader::new(store);

        let signals = reader.query_global_items(&profile());
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn query_snapshots_on_empty_store_returns_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        let reader = CorpusReader::new(store);
        assert!(reader.query_snapshots(&profile(), 3).is_empty());
    }
}
