pub mod asset_profile;
pub mod cache_schema;
pub mod config;
pub mod holding;
pub mod impact;
pub mod settings;
pub mod signal;
pub mod theme;

pub use asset_profile::AssetProfile;
pub use cache_schema::{cache_key, CacheCategory};
pub use config::{
    CacheConfig, ConcurrencyConfig, EngineConfig, LlmConfig, WebSearchBackend, WebSearchConfig,
};
pub use holding::Holding;
pub use impact::{ActionProbabilities, AggregateImpact, Direction, RiskTolerance, ThemeImpact};
pub use settings::{BaseRelevanceScores, FinalScoreWeights, RelevanceThresholds, ScoringSettings};
pub use signal::{EvidenceQuality, IntelligenceSignal, RawSignal, SignalSource};
pub use theme::{default_catalog, ThemeDefinition, ThemeRelevance, ThemeWeights};
