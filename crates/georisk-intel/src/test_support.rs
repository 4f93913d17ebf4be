//! Scenario-based mock adapters for exercising the pipeline without a
//! network connection. Unlike a plain canned-response stub, these read
//! their configured scenario and apply the same rules the real
//! providers document, so tests stay honest about what the pipeline
//! does with the data it's handed.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::IntelError;
use crate::llm::LlmClient;
use crate::web_search::{SearchResult, WebSearchProvider};

/// Canned web search provider that always returns the same fixed set of
/// results, regardless of query. Useful when a test only cares that
/// *some* results flow through the merge/validation stages.
pub struct MockWebSearchProvider {
    pub results: Vec<SearchResult>,
}

impl MockWebSearchProvider {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self { results }
    }

    pub fn empty() -> Self {
        Self { results: Vec::new() }
    }

    pub fn single_trusted_result(theme: &str) -> Self {
        Self {
            results: vec![SearchResult {
                title: format!("Analysts warn of {theme} escalation across emerging markets"),
                url: "https://reuters.com/world/example-article".to_string(),
                snippet: format!(
                    "Regional tensions tied to {theme} have intensified in recent weeks, \
                     with officials citing growing risk of further disruption to trade routes."
                ),
                published_date: Some("2026-07-20".to_string()),
            }],
        }
    }
}

#[async_trait]
impl WebSearchProvider for MockWebSearchProvider {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
        _trusted_domains: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>, IntelError> {
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}

/// A web search provider that always fails, for exercising the
/// resilience path in stage 3c (a failed theme search must not abort
/// retrieval for the remaining themes).
pub struct FailingWebSearchProvider;

#[async_trait]
impl WebSearchProvider for FailingWebSearchProvider {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
        _trusted_domains: Option<&[&str]>,
    ) -> Result<Vec<SearchResult>, IntelError> {
        Err(IntelError::Timeout(10))
    }
}

/// Scenario-style mock LLM client. Recognizes the shapes of prompts the
/// pipeline actually sends (query refinement, semantic analysis, batch
/// validation, summary generation) and returns JSON/text matching what a
/// real model would plausibly produce, instead of one fixed string for
/// every call.
pub struct ScenarioMockLlmClient {
    model_cascade: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScenarioMockLlmClient {
    pub fn new() -> Self {
        Self {
            model_cascade: vec!["mock-model-1".to_string()],
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for ScenarioMockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for ScenarioMockLlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str, _model: &str) -> Result<String, IntelError> {
        self.calls.lock().unwrap().push(user_prompt.to_string());

        if system_prompt.contains("search query") {
            return Ok("sanctions impact on emerging market energy assets".to_string());
        }
        if system_prompt.contains("semantic") || system_prompt.contains("relevance") {
            return Ok(serde_json::json!({
                "relevance_score": 0.75,
                "confidence_score": 0.8,
                "matched_themes": ["sanctions"],
                "reasoning": "Signal directly discusses sanctions affecting the asset's region.",
            })
            .to_string());
        }
        if system_prompt.contains("validat") {
            return Ok(serde_json::json!({
                "validations": [{
                    "signal_index": 0,
                    "validation_confidence": 0.9,
                    "is_corroborated": true,
                    "is_contradicted": false,
                    "corroborating_indices": [1],
                    "contradicting_indices": [],
                    "evidence_quality": "high",
                    "validation_reasoning": "Two independent sources report the same sanctions escalation.",
                }],
                "overall_coherence": 0.8,
                "contradiction_count": 0,
                "corroboration_count": 1,
                "analysis_summary": "Signals are broadly consistent with one corroborated pair.",
            })
            .to_string());
        }
        if system_prompt.contains("summary") {
            return Ok("Sanctions pressure has intensified, raising near-term downside risk.".to_string());
        }

        Ok(String::new())
    }

    fn model_cascade(&self) -> &[String] {
        &self.model_cascade
    }
}

/// An LLM client whose every call fails, for exercising the neutral
/// fallback paths throughout stages 3b/3e/4.
pub struct FailingLlmClient {
    model_cascade: Vec<String>,
}

impl FailingLlmClient {
    pub fn new() -> Self {
        Self {
            model_cascade: vec!["mock-model-1".to_string()],
        }
    }
}

impl Default for FailingLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str, _model: &str) -> Result<String, IntelError> {
        Err(IntelError::Timeout(5))
    }

    fn model_cascade(&self) -> &[String] {
        &self.model_cascade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scenario_llm_recognizes_semantic_prompt() {
        let client = ScenarioMockLlmClient::new();
        let response = client
            .complete("Assess semantic relevance", "signal text", "mock-model-1")
            .await
            .unwrap();
        assert!(response.contains("relevance_score"));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_llm_errors_on_every_call() {
        let client = FailingLlmClient::new();
        let result = client.complete("anything", "anything", "mock-model-1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mock_web_search_returns_configured_results() {
        let provider = MockWebSearchProvider::single_trusted_result("sanctions");
        let results = provider.search("query", 5, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].url.contains("reuters.com"));
    }

    #[tokio::test]
    async fn failing_web_search_always_errors() {
        let provider = FailingWebSearchProvider;
        let result = provider.search("query", 5, None).await;
        assert!(result.is_err());
    }
}
