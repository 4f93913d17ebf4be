use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Corpus,
    Web,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceQuality {
    High,
    Medium,
    Low,
    /// Unset — the signal has not been through batch validation.
    Unknown,
}

impl Default for EvidenceQuality {
    fn default() -> Self {
        EvidenceQuality::Unknown
    }
}

/// A piece of evidence produced by the corpus query or the web search
/// adapter, before any scoring has been applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawSignal {
    pub source: SignalSource,
    pub title: String,
    pub summary: String,
    pub topic: String,
    pub url: Option<String>,
    pub country: Option<String>,
    pub published_at: String,
    pub activity_level: Option<String>,
}

impl RawSignal {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("signal.title must not be empty".to_string());
        }
        Ok(())
    }
}

/// A `RawSignal` plus every score and validation field accumulated while
/// it passes through stage 3 (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntelligenceSignal {
    #[serde(flatten)]
    pub raw: RawSignal,

    pub base_relevance: f64,
    pub theme_match_score: f64,
    pub recency_score: f64,
    pub source_quality: f64,
    pub activity_level_score: f64,

    pub theme_match: Option<String>,
    pub relevance_score: f64,

    pub semantic_relevance: f64,
    pub semantic_confidence: f64,
    pub semantic_reasoning: String,

    pub validation_confidence: f64,
    pub is_corroborated: bool,
    pub is_contradicted: bool,
    pub corroboration_count: u32,
    pub evidence_quality: EvidenceQuality,
    pub validation_reasoning: String,

    pub confidence_multiplier: f64,
}

impl IntelligenceSignal {
    /// Constructs a signal with every post-stage-3a field at its pre-scored
    /// default; callers fill in the scoring fields immediately after.
    pub fn from_raw(raw: RawSignal) -> Self {
        Self {
            raw,
            base_relevance: 0.0,
            theme_match_score: 0.0,
            recency_score: 0.0,
            source_quality: 0.0,
            activity_level_score: 0.0,
            theme_match: None,
            relevance_score: 0.0,
            semantic_relevance: 0.0,
            semantic_confidence: 0.0,
            semantic_reasoning: String::new(),
            validation_confidence: 0.0,
            is_corroborated: false,
            is_contradicted: false,
            corroboration_count: 0,
            evidence_quality: EvidenceQuality::Unknown,
            validation_reasoning: String::new(),
            confidence_multiplier: 1.0,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.raw.url.as_deref()
    }
}
