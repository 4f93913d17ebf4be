//! georisk - Geopolitical Risk Analysis Engine
//!
//! Evaluates a portfolio holding's exposure to geopolitical risk by
//! characterizing the asset, identifying relevant themes, retrieving
//! corroborating intelligence, and synthesizing action probabilities.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use georisk::models::config::EngineConfig;
//! use georisk::models::impact::RiskTolerance;
//!
//! # async fn example(holding: georisk::models::holding::Holding) -> anyhow::Result<()> {
//! let config = EngineConfig::default();
//! let pipeline = georisk::build_pipeline(&config)?;
//! let result = georisk::evaluate(&pipeline, &holding, RiskTolerance::Medium, None).await?;
//! # Ok(())
//! # }
//! ```

pub use georisk_intel as intel;
pub use georisk_models as models;
pub use georisk_store as store;

use std::sync::Arc;
use std::time::Duration;

use georisk_intel::llm::{AnthropicClient, LlmClient};
use georisk_intel::pipeline::{DetailedResult, Pipeline};
use georisk_intel::web_search::{GeneralSearchProvider, ResearchSearchProvider, WebSearchProvider};
use georisk_intel::IntelError;
use georisk_models::config::{EngineConfig, WebSearchBackend};
use georisk_models::holding::Holding;
use georisk_models::impact::RiskTolerance;
use georisk_store::{Caches, CorpusReader, SettingsProvider, SqliteStore, ThemeCatalog};

/// Builds a `Pipeline` from configuration: opens the signal corpus
/// (once per collaborator, since `rusqlite::Connection` isn't shared
/// across them), wires up the three TTL caches, and resolves the
/// web-search/LLM adapters from the configured backend and environment
/// variables holding API keys.
pub fn build_pipeline(config: &EngineConfig) -> Result<Pipeline, anyhow::Error> {
    // The corpus is populated by a separate ingestion process; this engine
    // only ever reads it, so every connection here is opened read-only.
    let corpus_store = SqliteStore::open(&config.cache.sqlite_path)?;
    let settings_store = SqliteStore::open(&config.cache.sqlite_path)?;
    let theme_store = SqliteStore::open(&config.cache.sqlite_path)?;

    let corpus = Arc::new(CorpusReader::new(corpus_store));
    let settings = Arc::new(SettingsProvider::new(settings_store));
    let themes = Arc::new(ThemeCatalog::new(theme_store));

    let caches = Arc::new(Caches::new(
        Duration::from_secs(config.cache.semantic_ttl_seconds),
        Duration::from_secs(config.cache.batch_validation_ttl_seconds),
        Duration::from_secs(config.cache.retriever_ttl_seconds),
        config.cache.memory_max_capacity,
    ));

    let web_provider = build_web_search_provider(config);
    let llm = build_llm_client(config);

    Ok(Pipeline::new(
        corpus,
        caches,
        settings,
        themes,
        web_provider,
        llm,
        config.concurrency.web_search_fan_out,
    ))
}

fn build_web_search_provider(config: &EngineConfig) -> Arc<dyn WebSearchProvider> {
    let timeout = Duration::from_secs(config.concurrency.web_search_timeout_seconds);
    match config.web_search.backend {
        WebSearchBackend::Research => {
            let api_key = std::env::var(&config.web_search.research_api_key_env).unwrap_or_default();
            Arc::new(ResearchSearchProvider::new(
                "https://api.tavily.com".to_string(),
                api_key,
                timeout,
            ))
        }
        WebSearchBackend::General => {
            let api_key = std::env::var(&config.web_search.general_api_key_env).unwrap_or_default();
            Arc::new(GeneralSearchProvider::new(
                "https://google.serper.dev".to_string(),
                api_key,
                timeout,
            ))
        }
    }
}

/// `None` when no API key is configured in the environment: the pipeline
/// still runs, falling back to the non-LLM paths documented throughout
/// stages 2-5.
fn build_llm_client(config: &EngineConfig) -> Option<Arc<dyn LlmClient>> {
    let api_key = std::env::var(&config.llm.api_key_env).ok()?;
    if api_key.is_empty() {
        return None;
    }
    let timeout = Duration::from_secs(config.llm.semantic_timeout_seconds);
    Some(Arc::new(AnthropicClient::new(
        config.llm.base_url.clone(),
        api_key,
        config.llm.model_cascade.clone(),
        timeout,
    )) as Arc<dyn LlmClient>)
}

/// Runs the full pipeline for a single holding (§4.11 `runPipeline`).
pub async fn evaluate(
    pipeline: &Pipeline,
    holding: &Holding,
    risk_tolerance: RiskTolerance,
    lookback_days_override: Option<u32>,
) -> Result<DetailedResult, IntelError> {
    pipeline
        .run_pipeline(holding, risk_tolerance, lookback_days_override)
        .await
}
