use chrono::Utc;
use rusqlite::Connection;

use georisk_models::signal::{RawSignal, SignalSource};
use georisk_models::theme::{default_catalog, ThemeDefinition};
use georisk_models::ScoringSettings;

use crate::error::StoreError;

/// Schema for the three tables this engine reads. The signal corpus and
/// the settings/catalog tables are written by an ingestion collaborator;
/// this crate only ever reads them.
pub const SCHEMA_DDL: &str = "\
CREATE TABLE IF NOT EXISTS global_items (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    summary       TEXT NOT NULL,
    source_name   TEXT NOT NULL,
    source_url    TEXT NOT NULL,
    url           TEXT NOT NULL UNIQUE,
    published_at  TEXT NOT NULL,
    topic         TEXT NOT NULL,
    countries     TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_global_items_countries ON global_items(countries);

CREATE TABLE IF NOT EXISTS country_snapshots (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    activity_level  TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    events_json     TEXT NOT NULL,
    stats_json      TEXT NOT NULL,
    updated_at_db   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snapshots_activity ON country_snapshots(activity_level);
CREATE INDEX IF NOT EXISTS idx_snapshots_updated_db ON country_snapshots(updated_at_db);

CREATE TABLE IF NOT EXISTS scoring_settings (
    name        TEXT PRIMARY KEY,
    active      INTEGER NOT NULL,
    settings_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS theme_catalog (
    name        TEXT PRIMARY KEY,
    active      INTEGER NOT NULL,
    theme_json  TEXT NOT NULL
);
";

/// One stored global-item row, reshaped to a `RawSignal` for the retriever.
struct GlobalItemRow {
    title: String,
    summary: String,
    topic: String,
    url: String,
    published_at: String,
    countries: Vec<String>,
}

fn parse_countries(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Read-only accessor over the signal corpus, settings and theme catalog.
/// Holds a single `rusqlite::Connection` — callers are responsible for
/// synchronizing access (the connection itself is not `Sync`).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// In-memory database with the schema pre-created; used by tests and
    /// to seed an empty process-local store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_DDL)?;
        Ok(Self { conn })
    }

    fn global_item_rows(&self, limit: i64) -> Result<Vec<GlobalItemRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT title, summary, topic, url, published_at, countries \
             FROM global_items ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                let countries_raw: String = row.get(5)?;
                Ok(GlobalItemRow {
                    title: row.get(0)?,
                    summary: row.get(1)?,
                    topic: row.get(2)?,
                    url: row.get(3)?,
                    published_at: row.get(4)?,
                    countries: parse_countries(&countries_raw),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Global items whose `countries` array overlaps the given profile
    /// countries; falls back to the unfiltered set when that is empty.
    /// Ordered by ingestion time, capped at 200, per §4.6.
    pub fn query_global_items(&self, countries: &[String]) -> Result<Vec<RawSignal>, StoreError> {
        let rows = self.global_item_rows(200)?;
        let matched: Vec<&GlobalItemRow> = if countries.is_empty() {
            rows.iter().collect()
        } else {
            let overlapping: Vec<&GlobalItemRow> = rows
                .iter()
                .filter(|r| r.countries.iter().any(|c| countries.contains(c)))
                .collect();
            if overlapping.is_empty() {
                rows.iter().collect()
            } else {
                overlapping
            }
        };

        Ok(matched
            .into_iter()
            .map(|r| RawSignal {
                source: SignalSource::Corpus,
                title: r.title.clone(),
                summary: r.summary.clone(),
                topic: r.topic.clone(),
                url: Some(r.url.clone()),
                country: r.countries.first().cloned(),
                published_at: r.published_at.clone(),
                activity_level: None,
            })
            .collect())
    }

    /// Country snapshots with activity in {Critical, High, Medium},
    /// country-substring filtered then relaxed if empty, capped at 50
    /// (§4.6). Each retained event becomes one `RawSignal`.
    pub fn query_snapshots(
        &self,
        country_substring: Option<&str>,
        max_events_per_snapshot: usize,
    ) -> Result<Vec<RawSignal>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT name, activity_level, events_json \
             FROM country_snapshots \
             WHERE activity_level IN ('Critical', 'High', 'Medium') \
             ORDER BY \
               CASE activity_level WHEN 'Critical' THEN 0 WHEN 'High' THEN 1 ELSE 2 END, \
               updated_at_db DESC \
             LIMIT 50",
        )?;
        let rows: Vec<(String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let filtered: Vec<&(String, String, String)> = match country_substring {
            Some(needle) if !needle.is_empty() => {
                let subset: Vec<&(String, String, String)> = rows
                    .iter()
                    .filter(|(name, _, _)| name.to_lowercase().contains(&needle.to_lowercase()))
                    .collect();
                if subset.is_empty() {
                    rows.iter().collect()
                } else {
                    subset
                }
            }
            _ => rows.iter().collect(),
        };

        let mut signals = Vec::new();
        for (name, activity_level, events_json) in filtered {
            let events: Vec<SnapshotEvent> = serde_json::from_str(events_json).unwrap_or_default();
            for event in events.into_iter().take(max_events_per_snapshot) {
                signals.push(RawSignal {
                    source: SignalSource::Corpus,
                    title: event.title,
                    summary: event.summary,
                    topic: event.topic.unwrap_or_else(|| "snapshot".to_string()),
                    url: None,
                    country: Some(name.clone()),
                    published_at: event.updated_at,
                    activity_level: Some(activity_level.clone()),
                });
            }
        }
        Ok(signals)
    }

    /// Loads the active settings record, preferring one named "default",
    /// falling back to any active record, then `None` (caller falls back
    /// to built-in defaults) per §4.1's resolution order.
    pub fn load_active_settings(&self) -> Result<Option<ScoringSettings>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name, settings_json FROM scoring_settings WHERE active = 1")?;
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(None);
        }
        let chosen = rows
            .iter()
            .find(|(name, _)| name == "default")
            .or_else(|| rows.first())
            .expect("rows is non-empty");
        let settings: ScoringSettings = serde_json::from_str(&chosen.1)?;
        Ok(Some(settings))
    }

    /// Loads active theme definitions, or an empty vec if none are active
    /// (caller falls back to `default_catalog()`).
    pub fn load_active_themes(&self) -> Result<Vec<ThemeDefinition>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT theme_json FROM theme_catalog WHERE active = 1")?;
        let rows: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let themes = rows
            .iter()
            .filter_map(|json| serde_json::from_str(json).ok())
            .collect::<Vec<ThemeDefinition>>();
        Ok(themes)
    }

    /// Seeds the built-in default theme catalog into an empty table, for
    /// process start-up per §4.2's seeding requirement. No-op if the
    /// catalog already has rows.
    pub fn seed_default_themes_if_empty(&self) -> Result<(), StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM theme_catalog", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        for theme in default_catalog() {
            let json = serde_json::to_string(&theme)?;
            self.conn.execute(
                "INSERT OR REPLACE INTO theme_catalog (name, active, theme_json) VALUES (?1, 1, ?2)",
                rusqlite::params![theme.name, json],
            )?;
        }
        Ok(())
    }

    /// Test/seed helper mirroring the ingestion collaborator's writes.
    pub fn insert_global_item(
        &self,
        id: &str,
        title: &str,
        summary: &str,
        topic: &str,
        url: &str,
        published_at: &str,
        countries: &[&str],
    ) -> Result<(), StoreError> {
        let countries_json = serde_json::to_string(countries)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO global_items \
             (id, title, summary, source_name, source_url, url, published_at, topic, countries, created_at) \
             VALUES (?1, ?2, ?3, 'test', 'https://example.com', ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                id,
                title,
                summary,
                url,
                published_at,
                topic,
                countries_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
struct SnapshotEvent {
    title: String,
    summary: String,
    #[serde(default)]
    topic: Option<String>,
    updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_global_items_filters_by_country_overlap() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_global_item(
                "1",
                "Russia sanctions expand",
                "New measures announced.",
                "sanctions",
                "https://reuters.com/a",
                "2026-07-20",
                &["Russia"],
            )
            .unwrap();
        store
            .insert_global_item(
                "2",
                "Unrelated market note",
                "Nothing notable.",
                "general",
                "https://reuters.com/b",
                "2026-07-20",
                &["Brazil"],
            )
            .unwrap();

        let signals = store
            .query_global_items(&["Russia".to_string()])
            .unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].title, "Russia sanctions expand");
    }

    #[test]
    fn query_global_items_falls_back_when_overlap_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_global_item(
                "1",
                "Unrelated item",
                "Nothing notable.",
                "general",
                "https://reuters.com/a",
                "2026-07-20",
                &["Brazil"],
            )
            .unwrap();

        let signals = store
            .query_global_items(&["Russia".to_string()])
            .unwrap();
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn load_active_settings_returns_none_when_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_active_settings().unwrap().is_none());
    }

    #[test]
    fn seed_default_themes_populates_empty_catalog() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.seed_default_themes_if_empty().unwrap();
        let themes = store.load_active_themes().unwrap();
        assert_eq!(themes.len(), 8);
    }
}
