use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The five weights `finalScore` combines (§4.5); must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FinalScoreWeights {
    pub base_relevance: f64,
    pub theme_match: f64,
    pub recency: f64,
    pub source_quality: f64,
    pub activity_level: f64,
}

impl Default for FinalScoreWeights {
    fn default() -> Self {
        Self {
            base_relevance: 0.3,
            theme_match: 0.25,
            recency: 0.2,
            source_quality: 0.15,
            activity_level: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BaseRelevanceScores {
    pub country_exact: f64,
    pub country_partial: f64,
    pub region: f64,
    pub sector: f64,
}

impl Default for BaseRelevanceScores {
    fn default() -> Self {
        Self {
            country_exact: 0.5,
            country_partial: 0.3,
            region: 0.2,
            sector: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RelevanceThresholds {
    pub semantic: f64,
    pub relevance_low: f64,
    pub relevance_high: f64,
    pub theme_web: f64,
}

impl Default for RelevanceThresholds {
    fn default() -> Self {
        Self {
            semantic: 0.6,
            relevance_low: 0.05,
            relevance_high: 0.1,
            theme_web: 0.3,
        }
    }
}

fn default_activity_scores() -> HashMap<String, f64> {
    [
        ("critical".to_string(), 1.0),
        ("high".to_string(), 0.8),
        ("medium".to_string(), 0.5),
        ("low".to_string(), 0.2),
        ("default".to_string(), 0.3),
    ]
    .into_iter()
    .collect()
}

fn default_source_scores() -> HashMap<String, f64> {
    [
        ("reuters".to_string(), 0.95),
        ("associated press".to_string(), 0.95),
        ("bloomberg".to_string(), 0.9),
        ("bbc".to_string(), 0.9),
        ("financial times".to_string(), 0.9),
        ("wall street journal".to_string(), 0.9),
        ("default".to_string(), 0.7),
    ]
    .into_iter()
    .collect()
}

/// Tunable scoring parameters, resolved once per pipeline invocation and
/// memoized by the settings provider (§3, §4.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringSettings {
    pub weights: FinalScoreWeights,
    pub decay_constant: f64,
    pub base_relevance: BaseRelevanceScores,
    pub activity_scores: HashMap<String, f64>,
    pub source_scores: HashMap<String, f64>,
    pub thresholds: RelevanceThresholds,
    pub lookback_days: u32,
    pub max_signals: usize,
    pub max_events_per_snapshot: usize,
    pub use_semantic_filtering: bool,
    pub use_batch_validation: bool,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: FinalScoreWeights::default(),
            decay_constant: 30.0,
            base_relevance: BaseRelevanceScores::default(),
            activity_scores: default_activity_scores(),
            source_scores: default_source_scores(),
            thresholds: RelevanceThresholds::default(),
            lookback_days: 90,
            max_signals: 20,
            max_events_per_snapshot: 3,
            use_semantic_filtering: true,
            use_batch_validation: true,
        }
    }
}

impl ScoringSettings {
    /// Sum of the five weight fields; documented invariant is "sums to 1"
    /// but we tolerate small floating drift from persisted records.
    pub fn weight_sum(&self) -> f64 {
        self.weights.base_relevance
            + self.weights.theme_match
            + self.weights.recency
            + self.weights.source_quality
            + self.weights.activity_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = ScoringSettings::default();
        assert_eq!(settings.decay_constant, 30.0);
        assert_eq!(settings.lookback_days, 90);
        assert_eq!(settings.max_signals, 20);
        assert_eq!(settings.max_events_per_snapshot, 3);
        assert!(settings.use_semantic_filtering);
        assert!(settings.use_batch_validation);
        assert!((settings.weight_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn toml_round_trips() {
        let settings = ScoringSettings::default();
        let serialized = toml::to_string(&settings).expect("serialize");
        let parsed: ScoringSettings = toml::from_str(&serialized).expect("parse");
        assert_eq!(settings, parsed);
    }

    #[test]
    fn activity_scores_have_documented_defaults() {
        let settings = ScoringSettings::default();
        assert_eq!(settings.activity_scores.get("critical"), Some(&1.0));
        assert_eq!(settings.activity_scores.get("default"), Some(&0.3));
    }
}
