use serde::{Deserialize, Serialize};

/// Top-level configuration for the geopolitical-risk engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub web_search: WebSearchConfig,
    pub llm: LlmConfig,
    pub concurrency: ConcurrencyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            web_search: WebSearchConfig::default(),
            llm: LlmConfig::default(),
            concurrency: ConcurrencyConfig::default(),
        }
    }
}

/// Configuration for the corpus reader and the three TTL caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Path to the SQLite signal corpus (written by the ingestion
    /// collaborator, read by this engine).
    pub sqlite_path: String,
    pub retriever_ttl_seconds: u64,
    pub semantic_ttl_seconds: u64,
    pub batch_validation_ttl_seconds: u64,
    pub memory_max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/georisk_corpus.db".to_string(),
            retriever_ttl_seconds: 600,
            semantic_ttl_seconds: 3600,
            batch_validation_ttl_seconds: 3600,
            memory_max_capacity: 10_000,
        }
    }
}

/// Which web-search back-end to use (§6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WebSearchBackend {
    Research,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebSearchConfig {
    pub backend: WebSearchBackend,
    pub max_themes: usize,
    pub max_results: usize,
    pub use_llm_for_queries: bool,
    /// Environment variable name holding the research back-end's API key.
    /// Never the key value itself.
    pub research_api_key_env: String,
    /// Environment variable name holding the general back-end's API key.
    pub general_api_key_env: String,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            backend: WebSearchBackend::Research,
            max_themes: 3,
            max_results: 5,
            use_llm_for_queries: true,
            research_api_key_env: "RESEARCH_SEARCH_API_KEY".to_string(),
            general_api_key_env: "GENERAL_SEARCH_API_KEY".to_string(),
        }
    }
}

/// Configuration for the LLM-backed adapters (query refinement, semantic
/// relevance, batch validation) and their model cascade (§6, §9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    /// Environment variable name holding the LLM service API key.
    pub api_key_env: String,
    /// Tried in order until one responds without a model-not-found error.
    pub model_cascade: Vec<String>,
    pub query_refinement_timeout_seconds: u64,
    pub semantic_timeout_seconds: u64,
    pub batch_validation_timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: "LLM_API_KEY".to_string(),
            model_cascade: vec![
                "claude-3-5-sonnet-latest".to_string(),
                "claude-3-haiku-20240307".to_string(),
            ],
            query_refinement_timeout_seconds: 5,
            semantic_timeout_seconds: 20,
            batch_validation_timeout_seconds: 40,
        }
    }
}

/// Bounds on concurrent work within stage 3 (§5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConcurrencyConfig {
    pub web_search_fan_out: usize,
    pub semantic_filter_in_flight: usize,
    pub persistence_timeout_seconds: u64,
    pub persistence_max_retries: u32,
    pub web_search_timeout_seconds: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            web_search_fan_out: 3,
            semantic_filter_in_flight: 8,
            persistence_timeout_seconds: 10,
            persistence_max_retries: 3,
            web_search_timeout_seconds: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_engine_config() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.web_search.max_themes, 3);
        assert_eq!(config.web_search.max_results, 5);
        assert!(config.web_search.use_llm_for_queries);
        assert_eq!(config.cache.retriever_ttl_seconds, 600);
        assert_eq!(config.cache.semantic_ttl_seconds, 3600);
        assert_eq!(config.concurrency.web_search_fan_out, 3);
        assert_eq!(config.concurrency.semantic_filter_in_flight, 8);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[cache]
sqlite_path = "/tmp/test_corpus.db"
retriever_ttl_seconds = 600
semantic_ttl_seconds = 3600
batch_validation_ttl_seconds = 3600
memory_max_capacity = 5000

[web_search]
backend = "general"
max_themes = 2
max_results = 10
use_llm_for_queries = false
research_api_key_env = "RESEARCH_SEARCH_API_KEY"
general_api_key_env = "GENERAL_SEARCH_API_KEY"

[llm]
base_url = "https://api.anthropic.com"
api_key_env = "LLM_API_KEY"
model_cascade = ["claude-3-5-sonnet-latest"]
query_refinement_timeout_seconds = 5
semantic_timeout_seconds = 20
batch_validation_timeout_seconds = 40

[concurrency]
web_search_fan_out = 3
semantic_filter_in_flight = 8
persistence_timeout_seconds = 10
persistence_max_retries = 3
web_search_timeout_seconds = 10
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cache.sqlite_path, "/tmp/test_corpus.db");
        assert_eq!(config.web_search.backend, WebSearchBackend::General);
        assert!(!config.web_search.use_llm_for_queries);
    }
}
