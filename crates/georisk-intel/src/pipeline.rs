use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use georisk_models::asset_profile::AssetProfile;
use georisk_models::holding::Holding;
use georisk_models::impact::{ActionProbabilities, AggregateImpact, RiskTolerance};
use georisk_models::signal::IntelligenceSignal;
use georisk_models::theme::ThemeRelevance;

use georisk_store::{CorpusReader, Caches, SettingsProvider, ThemeCatalog};

use crate::characterization::characterize;
use crate::error::IntelError;
use crate::impact::assess_impact;
use crate::llm::LlmClient;
use crate::probability::synthesize_probabilities;
use crate::retriever::{Retriever, ThemeSearchMetadata};
use crate::theme_mapper::map_themes;
use crate::web_search::WebSearchProvider;

/// Everything `run_pipeline` produces, so callers can inspect any
/// intermediate artifact, not just the final probabilities (§6).
#[derive(Debug, Clone, Serialize)]
pub struct DetailedResult {
    pub profile: AssetProfile,
    pub themes: Vec<ThemeRelevance>,
    pub signals: Vec<IntelligenceSignal>,
    pub web_search_metadata: Vec<SerializableThemeSearchMetadata>,
    pub impact: AggregateImpact,
    pub probabilities: ActionProbabilities,
    pub risk_tolerance: RiskTolerance,
    pub lookback_days: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SerializableThemeSearchMetadata {
    pub theme: String,
    pub query: String,
    pub results_count: usize,
    pub signals_count: usize,
    pub error: Option<String>,
}

impl From<ThemeSearchMetadata> for SerializableThemeSearchMetadata {
    fn from(metadata: ThemeSearchMetadata) -> Self {
        Self {
            theme: metadata.theme,
            query: metadata.query,
            results_count: metadata.results_count,
            signals_count: metadata.signals_count,
            error: metadata.error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

/// One progress event emitted by `run_pipeline_stream` (§4.11).
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub step_id: &'static str,
    pub step_name: &'static str,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Orchestrates stages 1–5 behind one handle (§4.11). Built once per
/// process and shared across calls; owns the store/caches collaborators
/// the retriever and settings provider depend on.
pub struct Pipeline {
    corpus: Arc<CorpusReader>,
    caches: Arc<Caches>,
    settings: Arc<SettingsProvider>,
    themes: Arc<ThemeCatalog>,
    web_provider: Arc<dyn WebSearchProvider>,
    llm: Option<Arc<dyn LlmClient>>,
    web_search_fan_out: usize,
}

impl Pipeline {
    pub fn new(
        corpus: Arc<CorpusReader>,
        caches: Arc<Caches>,
        settings: Arc<SettingsProvider>,
        themes: Arc<ThemeCatalog>,
        web_provider: Arc<dyn WebSearchProvider>,
        llm: Option<Arc<dyn LlmClient>>,
        web_search_fan_out: usize,
    ) -> Self {
        Self {
            corpus,
            caches,
            settings,
            themes,
            web_provider,
            llm,
            web_search_fan_out,
        }
    }

    fn retriever(&self) -> Retriever {
        Retriever::new(
            self.corpus.clone(),
            self.caches.clone(),
            self.web_provider.clone(),
            self.llm.clone(),
            self.web_search_fan_out,
        )
    }

    /// §4.11 `runPipeline`: the only public entry point that can fail,
    /// and only with `IntelError::InvalidHolding` (stage 1's InputError,
    /// §7). Every other stage absorbs its own failures into documented
    /// fallbacks.
    pub async fn run_pipeline(
        &self,
        holding: &Holding,
        risk_tolerance: RiskTolerance,
        lookback_days_override: Option<u32>,
    ) -> Result<DetailedResult, IntelError> {
        holding.validate().map_err(IntelError::InvalidHolding)?;

        let mut settings = self.settings.get_active_settings();
        if let Some(lookback_days) = lookback_days_override {
            settings.lookback_days = lookback_days;
        }

        let profile = characterize(holding);
        let catalog = self.themes.list_active_themes();
        let themes = map_themes(&profile, &catalog);

        let (signals, metadata) = if themes.is_empty() {
            // Stage 2 empty ⇒ stage 3 short-circuits to corpus only (§7).
            let corpus_only = self.retriever();
            corpus_only.retrieve(&profile, &themes, &catalog, &settings).await
        } else {
            self.retriever().retrieve(&profile, &themes, &catalog, &settings).await
        };

        let impact = assess_impact(&profile, &signals, &themes, self.llm.clone()).await;
        let probabilities = synthesize_probabilities(&impact, risk_tolerance);

        Ok(DetailedResult {
            profile,
            themes,
            signals,
            web_search_metadata: metadata.into_iter().map(Into::into).collect(),
            impact,
            probabilities,
            risk_tolerance,
            lookback_days: settings.lookback_days,
        })
    }

    /// §4.11 supplemented operation: thin projection over `run_pipeline`,
    /// never a separate code path.
    pub async fn run_pipeline_simple(
        &self,
        holding: &Holding,
        risk_tolerance: RiskTolerance,
        lookback_days_override: Option<u32>,
    ) -> Result<ActionProbabilities, IntelError> {
        self.run_pipeline(holding, risk_tolerance, lookback_days_override)
            .await
            .map(|result| result.probabilities)
    }

    /// §4.11 `runPipelineStream`: emits one event per stage over a bounded
    /// channel. The `impact_assessment` event carries both the aggregate
    /// impact and the synthesized probabilities, matching the original
    /// generator's event shape. A cancelled token stops emission with no
    /// further events and no side effects.
    pub async fn run_pipeline_stream(
        &self,
        holding: Holding,
        risk_tolerance: RiskTolerance,
        lookback_days_override: Option<u32>,
        cancellation: CancellationToken,
    ) -> mpsc::Receiver<ProgressUpdate> {
        let (tx, rx) = mpsc::channel(8);
        let corpus = self.corpus.clone();
        let caches = self.caches.clone();
        let settings_provider = self.settings.clone();
        let theme_catalog = self.themes.clone();
        let web_provider = self.web_provider.clone();
        let llm = self.llm.clone();
        let web_search_fan_out = self.web_search_fan_out;

        tokio::spawn(async move {
            macro_rules! send_or_stop {
                ($event:expr) => {
                    if tx.send($event).await.is_err() {
                        return;
                    }
                };
            }

            if let Err(error) = holding.validate() {
                send_or_stop!(ProgressUpdate {
                    step_id: "characterization",
                    step_name: "Characterization",
                    status: StepStatus::Failed,
                    duration_ms: 0,
                    data: None,
                    error: Some(error),
                });
                return;
            }

            let mut settings = settings_provider.get_active_settings();
            if let Some(lookback_days) = lookback_days_override {
                settings.lookback_days = lookback_days;
            }

            let started = Instant::now();
            if cancellation.is_cancelled() {
                return;
            }
            let profile = characterize(&holding);
            send_or_stop!(ProgressUpdate {
                step_id: "characterization",
                step_name: "Characterization",
                status: StepStatus::Completed,
                duration_ms: started.elapsed().as_millis() as u64,
                data: serde_json::to_value(&profile).ok(),
                error: None,
            });

            if cancellation.is_cancelled() {
                return;
            }
            let started = Instant::now();
            let catalog = theme_catalog.list_active_themes();
            let themes = map_themes(&profile, &catalog);
            send_or_stop!(ProgressUpdate {
                step_id: "theme_identification",
                step_name: "Theme identification",
                status: StepStatus::Completed,
                duration_ms: started.elapsed().as_millis() as u64,
                data: serde_json::to_value(&themes).ok(),
                error: None,
            });

            if cancellation.is_cancelled() {
                return;
            }
            let started = Instant::now();
            let retriever = Retriever::new(corpus, caches, web_provider, llm.clone(), web_search_fan_out);
            let (signals, _metadata) = retriever.retrieve(&profile, &themes, &catalog, &settings).await;
            send_or_stop!(ProgressUpdate {
                step_id: "intelligence_retrieval",
                step_name: "Intelligence retrieval",
                status: StepStatus::Completed,
                duration_ms: started.elapsed().as_millis() as u64,
                data: serde_json::to_value(&signals).ok(),
                error: None,
            });

            if cancellation.is_cancelled() {
                return;
            }
            let started = Instant::now();
            let impact = assess_impact(&profile, &signals, &themes, llm).await;
            let probabilities = synthesize_probabilities(&impact, risk_tolerance);
            let data = serde_json::json!({
                "impact": impact,
                "probabilities": probabilities,
            });
            send_or_stop!(ProgressUpdate {
                step_id: "impact_assessment",
                step_name: "Impact assessment",
                status: StepStatus::Completed,
                duration_ms: started.elapsed().as_millis() as u64,
                data: Some(data),
                error: None,
            });
        });

        rx
    }
}
