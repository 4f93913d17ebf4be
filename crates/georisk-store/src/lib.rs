pub mod caches;
pub mod corpus;
pub mod error;
pub mod settings_provider;
pub mod sqlite;
pub mod theme_catalog;

pub use caches::{BatchValidationCacheStats, Caches, RetrieverCacheStats, SemanticCacheStats};
pub use corpus::CorpusReader;
pub use error::StoreError;
pub use settings_provider::SettingsProvider;
pub use sqlite::SqliteStore;
pub use theme_catalog::ThemeCatalog;
