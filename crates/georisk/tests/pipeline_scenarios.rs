use std::sync::Arc;
use std::time::Duration;

use georisk_intel::error::IntelError;
use georisk_intel::llm::LlmClient;
use georisk_intel::pipeline::Pipeline;
use georisk_intel::retriever::Retriever;
use georisk_intel::test_support::{FailingLlmClient, MockWebSearchProvider, ScenarioMockLlmClient};
use georisk_intel::web_search::SearchResult;
use georisk_models::holding::Holding;
use georisk_models::impact::{Direction, RiskTolerance};
use georisk_models::ScoringSettings;
use georisk_store::{Caches, CorpusReader, SettingsProvider, SqliteStore, ThemeCatalog};
use uuid::Uuid;

fn build_test_pipeline(
    web_provider: Arc<dyn georisk_intel::web_search::WebSearchProvider>,
    llm: Option<Arc<dyn georisk_intel::llm::LlmClient>>,
) -> Pipeline {
    let corpus = Arc::new(CorpusReader::new(SqliteStore::open_in_memory().unwrap()));
    let settings = Arc::new(SettingsProvider::new(SqliteStore::open_in_memory().unwrap()));
    let themes = Arc::new(ThemeCatalog::new(SqliteStore::open_in_memory().unwrap()));
    let caches = Arc::new(Caches::new(
        Duration::from_secs(60),
        Duration::from_secs(60),
        Duration::from_secs(60),
        1000,
    ));
    Pipeline::new(corpus, caches, settings, themes, web_provider, llm, 3)
}

fn holding(country: &str, region: &str, sector: &str, asset_class: &str, allocation_pct: f64) -> Holding {
    Holding {
        id: Uuid::new_v4(),
        name: format!("{country} {sector}"),
        ticker: None,
        isin: None,
        country: Some(country.to_string()),
        region: region.to_string(),
        sub_region: None,
        sector: sector.to_string(),
        asset_class: asset_class.to_string(),
        asset_type: "Equity".to_string(),
        value: 1_000_000.0,
        allocation_pct,
        currency: "USD".to_string(),
    }
}

/// S1: Russian energy ETF - sanctions/energy_security should dominate and
/// push the overall direction negative.
#[tokio::test]
async fn s1_russian_energy_etf_skews_negative() {
    let pipeline = build_test_pipeline(
        Arc::new(MockWebSearchProvider::single_trusted_result("sanctions")),
        Some(Arc::new(ScenarioMockLlmClient::new())),
    );
    let holding = holding("Russia", "Europe", "Energy", "Equity", 5.0);

    let result = pipeline
        .run_pipeline(&holding, RiskTolerance::Medium, Some(90))
        .await
        .unwrap();

    let theme_names: Vec<&str> = result.themes.iter().map(|t| t.theme.as_str()).collect();
    assert!(
        theme_names.contains(&"sanctions") || theme_names.contains(&"energy_security"),
        "expected sanctions or energy_security among {theme_names:?}"
    );
    assert!(result.probabilities.negative >= 0.4, "{:?}", result.probabilities);
}

/// S2: US diversified cash position - no theme clears the relevance
/// threshold, so the pipeline should fall through to the documented
/// neutral default.
#[tokio::test]
async fn s2_us_cash_position_is_neutral() {
    let pipeline = build_test_pipeline(Arc::new(MockWebSearchProvider::empty()), None);
    let holding = holding("United States", "Americas", "Cash", "Cash", 10.0);

    let result = pipeline
        .run_pipeline(&holding, RiskTolerance::Low, None)
        .await
        .unwrap();

    assert!(result.themes.is_empty(), "expected no themes, got {:?}", result.themes);
    assert!(result.signals.is_empty());
    assert_eq!(result.impact.overall_direction, Direction::Neutral);
    assert!((result.probabilities.negative - 0.2).abs() < 1e-6);
    assert!((result.probabilities.neutral - 0.6).abs() < 1e-6);
    assert!((result.probabilities.positive - 0.2).abs() < 1e-6);
}

/// S3: Turkey financials under Low tolerance should show a stronger
/// negative skew than the same scenario under High tolerance.
#[tokio::test]
async fn s3_low_tolerance_amplifies_negative_relative_to_high() {
    let holding = holding("Turkey", "Emerging Markets", "Financials", "Equity", 8.0);

    let low_pipeline = build_test_pipeline(
        Arc::new(MockWebSearchProvider::single_trusted_result("currency_volatility")),
        Some(Arc::new(ScenarioMockLlmClient::new())),
    );
    let low_result = low_pipeline
        .run_pipeline(&holding, RiskTolerance::Low, Some(90))
        .await
        .unwrap();

    let high_pipeline = build_test_pipeline(
        Arc::new(MockWebSearchProvider::single_trusted_result("currency_volatility")),
        Some(Arc::new(ScenarioMockLlmClient::new())),
    );
    let high_result = high_pipeline
        .run_pipeline(&holding, RiskTolerance::High, Some(90))
        .await
        .unwrap();

    assert_eq!(
        low_result.impact.overall_direction,
        Direction::Negative,
        "expected S3 to settle on a negative direction, got {:?}",
        low_result.impact
    );
    assert!(
        low_result.probabilities.negative >= high_result.probabilities.negative,
        "low={:?} high={:?}",
        low_result.probabilities,
        high_result.probabilities
    );
}

/// S6: corpus empty (simulating a down/unreachable persistence layer),
/// web search returns results - the pipeline must still complete using
/// only the web-sourced signals.
#[tokio::test]
async fn s6_empty_corpus_falls_back_to_web_results() {
    let results = vec![
        SearchResult {
            title: "Sanctions escalate against regional energy exporters".to_string(),
            url: "https://reuters.com/a".to_string(),
            snippet: "Officials warn of further restrictions on energy trade amid rising tension."
                .to_string(),
            published_date: Some("2026-07-01".to_string()),
        },
        SearchResult {
            title: "Second wave of sanctions targets financial sector".to_string(),
            url: "https://bloomberg.com/b".to_string(),
            snippet: "New measures add to existing embargo pressure on regional banks."
                .to_string(),
            published_date: Some("2026-07-10".to_string()),
        },
    ];
    let pipeline = build_test_pipeline(
        Arc::new(MockWebSearchProvider::new(results)),
        Some(Arc::new(ScenarioMockLlmClient::new())),
    );
    let holding = holding("Russia", "Europe", "Energy", "Equity", 5.0);

    let result = pipeline
        .run_pipeline(&holding, RiskTolerance::Medium, Some(90))
        .await
        .unwrap();

    assert!(!result.signals.is_empty());
    assert!(result.signals.iter().all(|s| s.raw.url.is_some()));
}

/// Universal invariant 1: ActionProbabilities always sum to 1.0.
#[tokio::test]
async fn probabilities_always_sum_to_one_across_scenarios() {
    let pipeline = build_test_pipeline(
        Arc::new(MockWebSearchProvider::single_trusted_result("sanctions")),
        Some(Arc::new(ScenarioMockLlmClient::new())),
    );
    for tolerance in [RiskTolerance::Low, RiskTolerance::Medium, RiskTolerance::High] {
        let holding = holding("Russia", "Europe", "Energy", "Equity", 5.0);
        let result = pipeline.run_pipeline(&holding, tolerance, Some(90)).await.unwrap();
        let sum = result.probabilities.negative + result.probabilities.neutral + result.probabilities.positive;
        assert!((sum - 1.0).abs() < 1e-6, "sum={sum}");
        assert!(result.probabilities.negative >= 0.0 && result.probabilities.negative <= 1.0);
        assert!(result.probabilities.neutral >= 0.0 && result.probabilities.neutral <= 1.0);
        assert!(result.probabilities.positive >= 0.0 && result.probabilities.positive <= 1.0);
    }
}

/// Invariant 2: every emitted theme clears its own configured threshold.
#[tokio::test]
async fn theme_relevance_always_clears_its_threshold() {
    let pipeline = build_test_pipeline(Arc::new(MockWebSearchProvider::empty()), None);
    let holding = holding("Russia", "Europe", "Energy", "Equity", 5.0);
    let result = pipeline.run_pipeline(&holding, RiskTolerance::Medium, Some(90)).await.unwrap();
    for theme in &result.themes {
        assert!(theme.relevance_score > 0.0, "theme {:?} has non-positive score", theme);
    }
}

/// Graceful degradation: one adapter failing must not abort the pipeline.
#[tokio::test]
async fn failing_llm_does_not_abort_pipeline() {
    let pipeline = build_test_pipeline(
        Arc::new(MockWebSearchProvider::single_trusted_result("sanctions")),
        Some(Arc::new(FailingLlmClient::new())),
    );
    let holding = holding("Russia", "Europe", "Energy", "Equity", 5.0);
    let result = pipeline.run_pipeline(&holding, RiskTolerance::Medium, Some(90)).await;
    assert!(result.is_ok());
}

/// Stage-1 InputError: an empty region must surface as an error, never
/// silently produce a result.
#[tokio::test]
async fn invalid_holding_returns_input_error() {
    let pipeline = build_test_pipeline(Arc::new(MockWebSearchProvider::empty()), None);
    let mut bad_holding = holding("Russia", "Europe", "Energy", "Equity", 5.0);
    bad_holding.region = "  ".to_string();

    let result = pipeline.run_pipeline(&bad_holding, RiskTolerance::Medium, None).await;
    assert!(matches!(result, Err(georisk_intel::IntelError::InvalidHolding(_))));
}

/// Stub LLM reporting every signal in a three-signal batch as mutually
/// corroborating, for S4.
struct CorroboratingLlm {
    model_cascade: Vec<String>,
}

impl CorroboratingLlm {
    fn new() -> Self {
        Self {
            model_cascade: vec!["mock-model-1".to_string()],
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for CorroboratingLlm {
    async fn complete(&self, system_prompt: &str, _user_prompt: &str, _model: &str) -> Result<String, IntelError> {
        if system_prompt.contains("semantic") || system_prompt.contains("relevance") {
            return Ok(serde_json::json!({
                "relevance_score": 0.9,
                "confidence_score": 0.9,
                "matched_themes": [],
                "reasoning": "directly relevant to the asset's profile.",
            })
            .to_string());
        }
        if system_prompt.contains("validat") {
            return Ok(serde_json::json!({
                "validations": [
                    {
                        "signal_index": 0,
                        "validation_confidence": 1.0,
                        "is_corroborated": true,
                        "is_contradicted": false,
                        "corroborating_indices": [1, 2],
                        "contradicting_indices": [],
                        "evidence_quality": "high",
                        "validation_reasoning": "Two other sources report the same event.",
                    },
                    {
                        "signal_index": 1,
                        "validation_confidence": 1.0,
                        "is_corroborated": true,
                        "is_contradicted": false,
                        "corroborating_indices": [0, 2],
                        "contradicting_indices": [],
                        "evidence_quality": "high",
                        "validation_reasoning": "Two other sources report the same event.",
                    },
                    {
                        "signal_index": 2,
                        "validation_confidence": 1.0,
                        "is_corroborated": true,
                        "is_contradicted": false,
                        "corroborating_indices": [0, 1],
                        "contradicting_indices": [],
                        "evidence_quality": "high",
                        "validation_reasoning": "Two other sources report the same event.",
                    },
                ],
                "overall_coherence": 0.95,
                "contradiction_count": 0,
                "corroboration_count": 3,
                "analysis_summary": "All three signals describe the same sanctions escalation.",
            })
            .to_string());
        }
        Ok(String::new())
    }

    fn model_cascade(&self) -> &[String] {
        &self.model_cascade
    }
}

/// Stub LLM reporting the first two signals of a three-signal batch as
/// contradicting each other, for S5. The third signal is left untouched
/// so batch validation's minimum-batch-size requirement is met without
/// implicating it in the contradiction.
struct ContradictingLlm {
    model_cascade: Vec<String>,
}

impl ContradictingLlm {
    fn new() -> Self {
        Self {
            model_cascade: vec!["mock-model-1".to_string()],
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ContradictingLlm {
    async fn complete(&self, system_prompt: &str, _user_prompt: &str, _model: &str) -> Result<String, IntelError> {
        if system_prompt.contains("semantic") || system_prompt.contains("relevance") {
            return Ok(serde_json::json!({
                "relevance_score": 0.9,
                "confidence_score": 0.9,
                "matched_themes": [],
                "reasoning": "directly relevant to the asset's profile.",
            })
            .to_string());
        }
        if system_prompt.contains("validat") {
            return Ok(serde_json::json!({
                "validations": [
                    {
                        "signal_index": 0,
                        "validation_confidence": 0.5,
                        "is_corroborated": false,
                        "is_contradicted": true,
                        "corroborating_indices": [],
                        "contradicting_indices": [1],
                        "evidence_quality": "medium",
                        "validation_reasoning": "Contradicts signal 1's claim.",
                    },
                    {
                        "signal_index": 1,
                        "validation_confidence": 0.5,
                        "is_corroborated": false,
                        "is_contradicted": true,
                        "corroborating_indices": [],
                        "contradicting_indices": [0],
                        "evidence_quality": "medium",
                        "validation_reasoning": "Contradicts signal 0's claim.",
                    },
                ],
                "overall_coherence": 0.4,
                "contradiction_count": 1,
                "corroboration_count": 0,
                "analysis_summary": "Signals 0 and 1 make opposing claims about the same event.",
            })
            .to_string());
        }
        Ok(String::new())
    }

    fn model_cascade(&self) -> &[String] {
        &self.model_cascade
    }
}

fn seed_three_signals(store: &SqliteStore, topic: &str) {
    for (i, source) in ["Reuters", "Bloomberg", "Al Jazeera"].iter().enumerate() {
        store
            .insert_global_item(
                &format!("seed-{i}"),
                &format!("{source}: Russia {topic} escalates"),
                &format!("{source} reports new developments in the Russia {topic} story."),
                topic,
                &format!("https://example.com/{source}/{i}"),
                "2026-07-20",
                &["Russia"],
            )
            .unwrap();
    }
}

async fn retrieve_signals(
    store: SqliteStore,
    llm: Arc<dyn LlmClient>,
    use_batch_validation: bool,
) -> Vec<georisk_models::IntelligenceSignal> {
    let corpus = Arc::new(CorpusReader::new(store));
    let caches = Arc::new(Caches::new(
        Duration::from_secs(60),
        Duration::from_secs(60),
        Duration::from_secs(60),
        1000,
    ));
    let retriever = Retriever::new(corpus, caches, Arc::new(MockWebSearchProvider::empty()), Some(llm), 3);
    let profile = georisk_intel::characterize(&holding("Russia", "Europe", "Energy", "Equity", 5.0));
    let mut settings = ScoringSettings::default();
    settings.use_batch_validation = use_batch_validation;
    let (signals, _metadata) = retriever.retrieve(&profile, &[], &[], &settings).await;
    signals
}

/// S4: three fabricated signals about the same event, batch validator
/// stubbed to report all three corroborated/evidence=high/confidence=1.0.
/// Each signal's final score must exceed its pre-validation score.
#[tokio::test]
async fn s4_corroborated_signals_boost_relevance_score() {
    let unvalidated_store = SqliteStore::open_in_memory().unwrap();
    seed_three_signals(&unvalidated_store, "sanctions");
    let unvalidated = retrieve_signals(unvalidated_store, Arc::new(CorroboratingLlm::new()), false).await;

    let validated_store = SqliteStore::open_in_memory().unwrap();
    seed_three_signals(&validated_store, "sanctions");
    let validated = retrieve_signals(validated_store, Arc::new(CorroboratingLlm::new()), true).await;

    assert_eq!(unvalidated.len(), 3, "{unvalidated:?}");
    assert_eq!(validated.len(), 3, "{validated:?}");

    for signal in &validated {
        let url = signal.raw.url.as_deref().unwrap();
        let pre = unvalidated
            .iter()
            .find(|s| s.raw.url.as_deref() == Some(url))
            .unwrap_or_else(|| panic!("missing pre-validation signal for {url}"));
        assert!(
            signal.relevance_score > pre.relevance_score,
            "expected corroboration to raise relevance_score for {url}: pre={} post={}",
            pre.relevance_score,
            signal.relevance_score
        );
        assert!(signal.is_corroborated);
        assert!(signal.corroboration_count >= 2);
        assert_eq!(signal.evidence_quality, georisk_models::EvidenceQuality::High);
    }
}

/// S5: two fabricated signals with opposite claims, batch validator
/// marks both contradicted/confidence=0.5. Both signals' final scores
/// must drop relative to their pre-validation scores; the third,
/// untouched signal must not be penalized.
#[tokio::test]
async fn s5_contradicted_pair_reduces_relevance_score() {
    let unvalidated_store = SqliteStore::open_in_memory().unwrap();
    seed_three_signals(&unvalidated_store, "oil exports");
    let unvalidated = retrieve_signals(unvalidated_store, Arc::new(ContradictingLlm::new()), false).await;

    let validated_store = SqliteStore::open_in_memory().unwrap();
    seed_three_signals(&validated_store, "oil exports");
    let validated = retrieve_signals(validated_store, Arc::new(ContradictingLlm::new()), true).await;

    assert_eq!(unvalidated.len(), 3, "{unvalidated:?}");
    assert_eq!(validated.len(), 3, "{validated:?}");

    let mut contradicted_count = 0;
    for signal in &validated {
        let url = signal.raw.url.as_deref().unwrap();
        let pre = unvalidated
            .iter()
            .find(|s| s.raw.url.as_deref() == Some(url))
            .unwrap_or_else(|| panic!("missing pre-validation signal for {url}"));
        if signal.is_contradicted {
            contradicted_count += 1;
            assert!(
                signal.relevance_score < pre.relevance_score,
                "expected contradiction to lower relevance_score for {url}: pre={} post={}",
                pre.relevance_score,
                signal.relevance_score
            );
        } else {
            assert!(
                signal.relevance_score >= pre.relevance_score - 1e-9,
                "untouched signal {url} should not be penalized by an unrelated contradiction"
            );
        }
    }
    assert_eq!(contradicted_count, 2, "expected exactly the fabricated pair to be marked contradicted");
}
