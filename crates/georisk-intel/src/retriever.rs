use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

use georisk_models::asset_profile::AssetProfile;
use georisk_models::cache_schema::{cache_key, CacheCategory};
use georisk_models::settings::ScoringSettings;
use georisk_models::signal::{EvidenceQuality, IntelligenceSignal, RawSignal};
use georisk_models::theme::{ThemeDefinition, ThemeRelevance};

use georisk_store::{CorpusReader, Caches};

use crate::llm::{BatchValidationResult, LlmClient, SemanticAnalysis};
use crate::scoring::{activity_level_score, final_score, recency_score, source_quality_score};
use crate::web_search::{self, WebSearchProvider};

const WEB_FAN_OUT_THEME_CAP: usize = 3;
const BATCH_VALIDATION_MIN_SIGNALS: usize = 3;
const BATCH_VALIDATION_MAX_SIGNALS: usize = 50;

/// Per-theme web search bookkeeping kept regardless of outcome (§4.8
/// stage 3c).
#[derive(Debug, Clone)]
pub struct ThemeSearchMetadata {
    pub theme: String,
    pub query: String,
    pub results_count: usize,
    pub signals_count: usize,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct RetrieverCacheKeyFields<'a> {
    country: Option<&'a str>,
    region: &'a str,
    sector: &'a str,
    asset_type: &'a str,
    themes: Vec<&'a str>,
    lookback_days: u32,
    use_semantic_filtering: bool,
    semantic_threshold: f64,
    use_batch_validation: bool,
}

fn retriever_cache_key(profile: &AssetProfile, themes: &[ThemeRelevance], settings: &ScoringSettings) -> String {
    let mut theme_names: Vec<&str> = themes.iter().map(|t| t.theme.as_str()).collect();
    theme_names.sort();
    cache_key(
        CacheCategory::Retriever,
        &RetrieverCacheKeyFields {
            country: profile.country.as_deref(),
            region: &profile.region,
            sector: &profile.sector,
            asset_type: &profile.asset_type,
            themes: theme_names,
            lookback_days: settings.lookback_days,
            use_semantic_filtering: settings.use_semantic_filtering,
            semantic_threshold: settings.thresholds.semantic,
            use_batch_validation: settings.use_batch_validation,
        },
    )
}

#[derive(Serialize)]
struct SemanticCacheKeyFields<'a> {
    title: &'a str,
    summary: &'a str,
    country: Option<&'a str>,
    sector: &'a str,
    themes: Vec<&'a str>,
}

#[derive(Serialize)]
struct BatchValidationCacheKeyFields<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

/// Orchestrates intelligence retrieval stages 3a–3f (§4.8).
pub struct Retriever {
    corpus: Arc<CorpusReader>,
    caches: Arc<Caches>,
    web_provider: Arc<dyn WebSearchProvider>,
    llm: Option<Arc<dyn LlmClient>>,
    web_search_fan_out: usize,
}

impl Retriever {
    pub fn new(
        corpus: Arc<CorpusReader>,
        caches: Arc<Caches>,
        web_provider: Arc<dyn WebSearchProvider>,
        llm: Option<Arc<dyn LlmClient>>,
        web_search_fan_out: usize,
    ) -> Self {
        Self {
            corpus,
            caches,
            web_provider,
            llm,
            web_search_fan_out,
        }
    }

    pub async fn retrieve(
        &self,
        profile: &AssetProfile,
        themes: &[ThemeRelevance],
        catalog: &[ThemeDefinition],
        settings: &ScoringSettings,
    ) -> (Vec<IntelligenceSignal>, Vec<ThemeSearchMetadata>) {
        let key = retriever_cache_key(profile, themes, settings);
        if let Some(cached) = self.caches.get_retriever(&key).await {
            if let Ok(signals) = serde_json::from_str::<Vec<IntelligenceSignal>>(&cached) {
                return (signals, Vec::new());
            }
        }

        let corpus_signals = self.stage_3a_corpus_scoring(profile, themes, catalog, settings);
        let filtered = self.stage_3b_semantic_filter(corpus_signals, profile, themes, settings).await;
        let (web_signals, metadata) = self.stage_3c_web_fan_out(profile, themes, settings).await;

        let mut merged = self.stage_3d_merge(filtered, web_signals);
        self.stage_3e_batch_validation(&mut merged, profile, settings).await;
        merged.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap()
                .then_with(|| a.url().unwrap_or_default().cmp(b.url().unwrap_or_default()))
        });
        let truncated: Vec<IntelligenceSignal> = merged.into_iter().take(settings.max_signals).collect();

        if let Ok(json) = serde_json::to_string(&truncated) {
            self.caches.insert_retriever(key, json).await;
        }

        (truncated, metadata)
    }

    fn stage_3a_corpus_scoring(
        &self,
        profile: &AssetProfile,
        themes: &[ThemeRelevance],
        catalog: &[ThemeDefinition],
        settings: &ScoringSettings,
    ) -> Vec<IntelligenceSignal> {
        let global_items = self.corpus.query_global_items(profile);
        let snapshots = self.corpus.query_snapshots(profile, settings.max_events_per_snapshot);

        let mut scored: Vec<IntelligenceSignal> = Vec::new();
        for raw in global_items.into_iter().chain(snapshots.into_iter()) {
            let is_snapshot = raw.activity_level.is_some();
            let mut signal = score_raw_signal(raw, profile, themes, catalog, settings, is_snapshot);

            let threshold = if scored.len() < 5 {
                settings.thresholds.relevance_low
            } else {
                settings.thresholds.relevance_high
            };
            if signal.relevance_score >= threshold {
                signal.evidence_quality = EvidenceQuality::Unknown;
                scored.push(signal);
            }
        }
        scored
    }

    async fn stage_3b_semantic_filter(
        &self,
        signals: Vec<IntelligenceSignal>,
        profile: &AssetProfile,
        themes: &[ThemeRelevance],
        settings: &ScoringSettings,
    ) -> Vec<IntelligenceSignal> {
        if !settings.use_semantic_filtering {
            return signals;
        }
        let Some(llm) = self.llm.as_ref() else {
            return signals;
        };

        let top_theme_names: Vec<&str> = themes.iter().take(3).map(|t| t.theme.as_str()).collect();
        let mut retained = Vec::new();
        for mut signal in signals {
            let analysis = self
                .semantic_analysis(llm.as_ref(), &signal, profile, &top_theme_names)
                .await;
            if analysis.relevance_score < settings.thresholds.semantic {
                continue;
            }
            signal.semantic_relevance = analysis.relevance_score;
            signal.semantic_confidence = analysis.confidence_score;
            signal.semantic_reasoning = analysis.reasoning;
            if signal.theme_match.is_none() {
                signal.theme_match = analysis.matched_themes.into_iter().next();
            }
            retained.push(signal);
        }
        retained
    }

    async fn semantic_analysis(
        &self,
        llm: &dyn LlmClient,
        signal: &IntelligenceSignal,
        profile: &AssetProfile,
        top_themes: &[&str],
    ) -> SemanticAnalysis {
        let key = cache_key(
            CacheCategory::Semantic,
            &SemanticCacheKeyFields {
                title: &signal.raw.title,
                summary: &signal.raw.summary,
                country: profile.country.as_deref(),
                sector: &profile.sector,
                themes: top_themes.to_vec(),
            },
        );
        if let Some(cached) = self.caches.get_semantic(&key).await {
            if let Ok(parsed) = serde_json::from_str(&cached) {
                return parsed;
            }
        }

        let system_prompt = "Return strict JSON: {relevance_score, confidence_score, matched_themes, reasoning}.";
        let user_prompt = format!(
            "Title: {}\nSummary: {}\nCountry: {:?}\nSector: {}\nThemes: {:?}",
            signal.raw.title, signal.raw.summary, profile.country, profile.sector, top_themes
        );

        let analysis = match llm.complete_with_cascade(system_prompt, &user_prompt).await {
            Some(text) => crate::llm::extract_json_object(&text)
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_else(SemanticAnalysis::neutral_fallback),
            None => SemanticAnalysis::neutral_fallback(),
        };

        if let Ok(json) = serde_json::to_string(&analysis) {
            self.caches.insert_semantic(key, json).await;
        }
        analysis
    }

    async fn stage_3c_web_fan_out(
        &self,
        profile: &AssetProfile,
        themes: &[ThemeRelevance],
        settings: &ScoringSettings,
    ) -> (Vec<IntelligenceSignal>, Vec<ThemeSearchMetadata>) {
        let eligible: Vec<&ThemeRelevance> = themes
            .iter()
            .filter(|t| t.relevance_score >= settings.thresholds.theme_web)
            .take(WEB_FAN_OUT_THEME_CAP)
            .collect();

        let mut tasks = FuturesUnordered::new();
        let mut pending = eligible.into_iter();
        let mut in_flight = 0;
        let fan_out = self.web_search_fan_out.max(1);

        let mut all_signals = Vec::new();
        let mut all_metadata = Vec::new();

        loop {
            while in_flight < fan_out {
                match pending.next() {
                    Some(theme) => {
                        in_flight += 1;
                        tasks.push(self.search_one_theme(profile, theme, settings));
                    }
                    None => break,
                }
            }
            let Some((metadata, signals)) = tasks.next().await else {
                break;
            };
            in_flight -= 1;
            all_signals.extend(signals);
            all_metadata.push(metadata);
        }

        (all_signals, all_metadata)
    }

    async fn search_one_theme(
        &self,
        profile: &AssetProfile,
        theme: &ThemeRelevance,
        settings: &ScoringSettings,
    ) -> (ThemeSearchMetadata, Vec<IntelligenceSignal>) {
        let query = web_search::build_query(
            profile,
            theme,
            settings.lookback_days,
            self.llm.as_deref().map(|l| l as &dyn LlmClient),
        )
        .await;

        match web_search::search_theme(profile, theme, &query, 5, self.web_provider.as_ref()).await {
            Ok(raw_signals) => {
                let results_count = raw_signals.len();
                let signals: Vec<IntelligenceSignal> = raw_signals
                    .into_iter()
                    .map(|raw| web_signal_to_intelligence(raw, theme, settings))
                    .collect();
                (
                    ThemeSearchMetadata {
                        theme: theme.theme.clone(),
                        query,
                        results_count,
                        signals_count: signals.len(),
                        error: None,
                    },
                    signals,
                )
            }
            Err(error) => (
                ThemeSearchMetadata {
                    theme: theme.theme.clone(),
                    query,
                    results_count: 0,
                    signals_count: 0,
                    error: Some(error.to_string()),
                },
                Vec::new(),
            ),
        }
    }

    fn stage_3d_merge(
        &self,
        corpus_signals: Vec<IntelligenceSignal>,
        web_signals: Vec<IntelligenceSignal>,
    ) -> Vec<IntelligenceSignal> {
        let mut by_url: std::collections::HashMap<String, IntelligenceSignal> = std::collections::HashMap::new();
        let mut no_url: Vec<IntelligenceSignal> = Vec::new();

        for signal in corpus_signals.into_iter().chain(web_signals.into_iter()) {
            match signal.url().map(|s| s.to_string()) {
                Some(url) => {
                    by_url
                        .entry(url)
                        .and_modify(|existing| {
                            if signal.relevance_score > existing.relevance_score {
                                *existing = signal.clone();
                            }
                        })
                        .or_insert(signal);
                }
                None => no_url.push(signal),
            }
        }

        let mut merged: Vec<IntelligenceSignal> = by_url.into_values().chain(no_url).collect();
        merged.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap()
                .then_with(|| a.url().unwrap_or_default().cmp(b.url().unwrap_or_default()))
        });
        merged
    }

    async fn stage_3e_batch_validation(
        &self,
        signals: &mut [IntelligenceSignal],
        profile: &AssetProfile,
        settings: &ScoringSettings,
    ) {
        if !settings.use_batch_validation || signals.len() < BATCH_VALIDATION_MIN_SIGNALS {
            return;
        }
        let Some(llm) = self.llm.as_ref() else {
            return;
        };

        let batch_len = signals.len().min(BATCH_VALIDATION_MAX_SIGNALS);
        let pairs: Vec<(&str, &str)> = signals[..batch_len]
            .iter()
            .map(|s| (s.raw.title.as_str(), s.raw.summary.as_str()))
            .collect();
        let key = cache_key(CacheCategory::BatchValidation, &BatchValidationCacheKeyFields { pairs: pairs.clone() });

        let result: BatchValidationResult = if let Some(cached) = self.caches.get_batch_validation(&key).await {
            serde_json::from_str(&cached).unwrap_or_else(|_| BatchValidationResult::neutral_fallback(batch_len))
        } else {
            let system_prompt = "Return strict JSON describing cross-signal validation.";
            let user_prompt = format!(
                "Country: {:?}, Sector: {}. Signals: {:?}",
                profile.country, profile.sector, pairs
            );
            let result = match llm.complete_with_cascade(system_prompt, &user_prompt).await {
                Some(text) => crate::llm::extract_json_object(&text)
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_else(|| BatchValidationResult::neutral_fallback(batch_len)),
                None => BatchValidationResult::neutral_fallback(batch_len),
            };
            if let Ok(json) = serde_json::to_string(&result) {
                self.caches.insert_batch_validation(key, json).await;
            }
            result
        };

        for validation in &result.validations {
            let Some(signal) = signals.get_mut(validation.signal_index) else {
                continue;
            };
            let mut multiplier = 1.0_f64;
            if validation.is_corroborated {
                multiplier *= 1.3;
            }
            if validation.is_contradicted {
                multiplier *= 0.5;
            }
            match validation.evidence_quality.as_str() {
                "high" => multiplier *= 1.2,
                "low" => multiplier *= 0.7,
                _ => {}
            }
            multiplier *= validation.validation_confidence;

            signal.confidence_multiplier = multiplier;
            signal.relevance_score = (signal.relevance_score * multiplier).min(1.0);
            signal.validation_confidence = validation.validation_confidence;
            signal.is_corroborated = validation.is_corroborated;
            signal.is_contradicted = validation.is_contradicted;
            signal.corroboration_count = validation.corroborating_indices.len() as u32;
            signal.evidence_quality = match validation.evidence_quality.as_str() {
                "high" => EvidenceQuality::High,
                "medium" => EvidenceQuality::Medium,
                "low" => EvidenceQuality::Low,
                _ => EvidenceQuality::Unknown,
            };
            signal.validation_reasoning = validation.validation_reasoning.clone();
        }
    }
}

fn score_raw_signal(
    raw: RawSignal,
    profile: &AssetProfile,
    themes: &[ThemeRelevance],
    catalog: &[ThemeDefinition],
    settings: &ScoringSettings,
    is_snapshot: bool,
) -> IntelligenceSignal {
    let country_multiplier = if is_snapshot { 1.4 } else { 1.0 };
    let base_relevance = base_relevance_score(&raw, profile, settings) * country_multiplier;
    let (theme_match, theme_match_score) = best_theme_match(&raw, themes, catalog);
    let recency = recency_score(&raw.published_at, settings.lookback_days, settings.decay_constant);
    let source_quality = if is_snapshot {
        0.8
    } else {
        source_quality_score(raw.topic.as_str(), &settings.source_scores)
    };
    let activity = activity_level_score(raw.activity_level.as_deref(), &settings.activity_scores);

    let relevance = final_score(
        base_relevance.min(1.0),
        theme_match_score,
        recency,
        source_quality,
        if is_snapshot { activity } else { 0.0 },
        settings,
    );

    let mut signal = IntelligenceSignal::from_raw(raw);
    signal.base_relevance = base_relevance.min(1.0);
    signal.theme_match_score = theme_match_score;
    signal.recency_score = recency;
    signal.source_quality = source_quality;
    signal.activity_level_score = activity;
    signal.theme_match = theme_match;
    signal.relevance_score = relevance;
    signal
}

fn base_relevance_score(raw: &RawSignal, profile: &AssetProfile, settings: &ScoringSettings) -> f64 {
    let mut score = 0.0;
    match (&raw.country, &profile.country) {
        (Some(signal_country), Some(profile_country)) if signal_country == profile_country => {
            score += settings.base_relevance.country_exact;
        }
        (Some(signal_country), Some(profile_country))
            if signal_country.to_lowercase().contains(&profile_country.to_lowercase()) =>
        {
            score += settings.base_relevance.country_partial;
        }
        _ => {}
    }
    if raw.topic.to_lowercase().contains(&profile.region.to_lowercase()) {
        score += settings.base_relevance.region;
    }
    if raw.topic.to_lowercase().contains(&profile.sector.to_lowercase()) {
        score += settings.base_relevance.sector;
    }
    score.min(1.0)
}

fn best_theme_match(raw: &RawSignal, themes: &[ThemeRelevance], catalog: &[ThemeDefinition]) -> (Option<String>, f64) {
    let haystack = format!("{} {} {}", raw.title, raw.summary, raw.topic).to_lowercase();
    let mut best: Option<(String, f64)> = None;

    for theme in themes {
        let Some(definition) = catalog.iter().find(|d| d.name == theme.theme) else {
            continue;
        };
        if definition.keywords.is_empty() {
            continue;
        }
        let matches = definition
            .keywords
            .iter()
            .filter(|kw| haystack.contains(&kw.to_lowercase()))
            .count();
        let score = (matches as f64 / definition.keywords.len() as f64) * theme.relevance_score;
        let is_better = match &best {
            Some((_, best_score)) => score > *best_score,
            None => true,
        };
        if is_better {
            best = Some((theme.theme.clone(), score));
        }
    }

    match best {
        Some((name, score)) if score > 0.0 => (Some(name), score),
        _ => (None, 0.0),
    }
}

fn web_signal_to_intelligence(raw: RawSignal, theme: &ThemeRelevance, settings: &ScoringSettings) -> IntelligenceSignal {
    let recency = recency_score(&raw.published_at, settings.lookback_days, settings.decay_constant);
    let trust = raw.url.as_deref().map(web_search::trust_bonus).unwrap_or(0.0);
    let source_quality = (0.7 + trust).min(1.0);

    let relevance = final_score(0.5, theme.relevance_score, recency, source_quality, 0.0, settings);

    let mut signal = IntelligenceSignal::from_raw(raw);
    signal.base_relevance = 0.5;
    signal.theme_match_score = theme.relevance_score;
    signal.recency_score = recency;
    signal.source_quality = source_quality;
    signal.theme_match = Some(theme.theme.clone());
    signal.relevance_score = relevance;
    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriever_cache_key_is_stable_across_theme_order() {
        let profile = test_profile();
        let settings = ScoringSettings::default();
        let theme_a = ThemeRelevance {
            theme: "sanctions".to_string(),
            relevance_score: 0.5,
            reasoning: String::new(),
            keywords_matched: vec![],
        };
        let theme_b = ThemeRelevance {
            theme: "energy_security".to_string(),
            relevance_score: 0.4,
            reasoning: String::new(),
            keywords_matched: vec![],
        };
        let key_ab = retriever_cache_key(&profile, &[theme_a.clone(), theme_b.clone()], &settings);
        let key_ba = retriever_cache_key(&profile, &[theme_b, theme_a], &settings);
        assert_eq!(key_ab, key_ba);
    }

    fn test_profile() -> AssetProfile {
        use georisk_models::holding::Holding;
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
    fn base_relevance_scores_exact_country_match() {
        let profile = test_profile();
        let settings = ScoringSettings::default();
        let raw = RawSignal {
            source: georisk_models::signal::SignalSource::Corpus,
            title: "t".to_string(),
            summary: "s".to_string(),
            topic: "europe energy".to_string(),
            url: None,
            country: Some("Russia".to_string()),
            published_at: "2026-01-01".to_string(),
            activity_level: None,
        };
        let score = base_relevance_score(&raw, &profile, &settings);
        assert!(score > 0.5);
    }
}
