use std::collections::HashMap;
use std::sync::Arc;

use georisk_models::asset_profile::AssetProfile;
use georisk_models::impact::{AggregateImpact, Direction, ThemeImpact};
use georisk_models::signal::IntelligenceSignal;
use georisk_models::theme::ThemeRelevance;

use crate::llm::LlmClient;

const NEGATIVE_TERMS: &[&str] = &[
    "conflict",
    "sanction",
    "instability",
    "decline",
    "risk",
    "tension",
    "dispute",
    "threat",
    "volatility",
    "uncertainty",
    "loss",
    "embargo",
    "restriction",
    "protest",
    "unrest",
    "war",
    "attack",
];

const POSITIVE_TERMS: &[&str] = &[
    "growth",
    "improve",
    "stability",
    "recovery",
    "positive",
    "strength",
    "agreement",
    "cooperation",
    "progress",
    "expansion",
    "boost",
    "gain",
];

const DOMINANCE_RATIO: f64 = 0.4;

fn count_polarity(signals: &[&IntelligenceSignal]) -> (usize, usize, usize) {
    let mut positive = 0;
    let mut negative = 0;
    for signal in signals {
        let text = format!("{} {}", signal.raw.title, signal.raw.summary).to_lowercase();
        let neg_hits = NEGATIVE_TERMS.iter().filter(|t| text.contains(*t)).count();
        let pos_hits = POSITIVE_TERMS.iter().filter(|t| text.contains(*t)).count();
        if neg_hits > pos_hits {
            negative += 1;
        } else if pos_hits > neg_hits {
            positive += 1;
        }
    }
    let neutral = signals.len() - positive - negative;
    (negative, neutral, positive)
}

fn direction_adjustment(theme: &str, direction: Direction, negative: usize, positive: usize) -> f64 {
    if negative == 0 {
        return 0.0;
    }
    match theme {
        "sanctions" => 0.2,
        "political_instability" => 0.15,
        "trade_disruption" => 0.15,
        "currency_volatility" if negative > positive => 0.1,
        "energy_security" => 0.1,
        _ => {
            let _ = direction;
            0.0
        }
    }
}

fn fallback_summary(theme: &str, direction: Direction, signal_count: usize, confidence: f64) -> String {
    format!(
        "{theme} shows a {} signal from {signal_count} sources with {:.0}% confidence.",
        direction_word(direction),
        confidence * 100.0
    )
}

fn direction_word(direction: Direction) -> &'static str {
    match direction {
        Direction::Negative => "negative",
        Direction::Neutral => "neutral",
        Direction::Positive => "positive",
    }
}

/// Stage 4 (§4.9): groups signals by matched theme, scores direction /
/// magnitude / confidence per theme, then aggregates.
pub async fn assess_impact(
    profile: &AssetProfile,
    signals: &[IntelligenceSignal],
    themes: &[ThemeRelevance],
    llm: Option<Arc<dyn LlmClient>>,
) -> AggregateImpact {
    let mut grouped: HashMap<&str, Vec<&IntelligenceSignal>> = HashMap::new();
    for signal in signals {
        if let Some(theme_name) = signal.theme_match.as_deref() {
            grouped.entry(theme_name).or_default().push(signal);
        }
    }

    let theme_relevance: HashMap<&str, f64> = themes.iter().map(|t| (t.theme.as_str(), t.relevance_score)).collect();

    let mut theme_impacts = Vec::new();
    for (theme_name, theme_signals) in &grouped {
        let relevance = *theme_relevance.get(theme_name).unwrap_or(&0.3);
        let impact = assess_theme(profile, theme_name, theme_signals, relevance, llm.as_deref()).await;
        theme_impacts.push(impact);
    }
    theme_impacts.sort_by(|a, b| b.magnitude.partial_cmp(&a.magnitude).unwrap());

    let total_signals: usize = theme_impacts.iter().map(|t| t.signal_count).sum();
    let mut weighted_negative = 0.0;
    let mut weighted_positive = 0.0;
    let mut total_weight = 0.0;
    let mut confidence_sum = 0.0;

    for impact in &theme_impacts {
        let weight = impact.magnitude * impact.confidence;
        total_weight += weight;
        match impact.direction {
            Direction::Negative => weighted_negative += weight,
            Direction::Positive => weighted_positive += weight,
            Direction::Neutral => {}
        }
        confidence_sum += impact.confidence;
    }

    let (overall_direction, overall_magnitude) = if weighted_negative > weighted_positive
        && weighted_negative > DOMINANCE_RATIO * total_weight
    {
        let magnitude = if total_weight > 0.0 { weighted_negative / total_weight } else { 0.0 };
        (Direction::Negative, magnitude.min(1.0))
    } else if weighted_positive > weighted_negative && weighted_positive > DOMINANCE_RATIO * total_weight {
        let magnitude = if total_weight > 0.0 { weighted_positive / total_weight } else { 0.0 };
        (Direction::Positive, magnitude.min(1.0))
    } else {
        (Direction::Neutral, 0.3)
    };

    let avg_theme_confidence = if theme_impacts.is_empty() {
        0.0
    } else {
        confidence_sum / theme_impacts.len() as f64
    };
    let overall_confidence = avg_theme_confidence * 0.7 + (total_signals as f64 / 20.0).min(1.0) * 0.3;

    AggregateImpact {
        overall_direction,
        overall_magnitude: overall_magnitude.clamp(0.0, 1.0),
        overall_confidence: overall_confidence.clamp(0.0, 1.0),
        theme_impacts,
        total_signals,
    }
}

async fn assess_theme(
    profile: &AssetProfile,
    theme_name: &str,
    signals: &[&IntelligenceSignal],
    theme_relevance: f64,
    llm: Option<&dyn LlmClient>,
) -> ThemeImpact {
    let (negative, _neutral, positive) = count_polarity(signals);
    let total = signals.len().max(1);

    let direction = if negative > positive && negative as f64 > DOMINANCE_RATIO * total as f64 {
        Direction::Negative
    } else if positive > negative && positive as f64 > DOMINANCE_RATIO * total as f64 {
        Direction::Positive
    } else {
        Direction::Neutral
    };

    let dominant_count = match direction {
        Direction::Negative => negative,
        Direction::Positive => positive,
        Direction::Neutral => total - negative - positive,
    };

    let mut magnitude = (dominant_count as f64 / total as f64) * theme_relevance;
    magnitude += direction_adjustment(theme_name, direction, negative, positive);
    let magnitude = magnitude.clamp(0.0, 1.0);

    let confidence = ((signals.len() as f64 / 10.0) * 0.5 + theme_relevance * 0.5).min(1.0);

    let summary = generate_summary(profile, theme_name, direction, signals, confidence, llm).await;

    ThemeImpact {
        theme: theme_name.to_string(),
        direction,
        magnitude,
        confidence,
        reasoning: format!(
            "{negative} negative / {positive} positive signals out of {total}, theme relevance {theme_relevance:.2}"
        ),
        signal_count: signals.len(),
        summary,
    }
}

async fn generate_summary(
    profile: &AssetProfile,
    theme_name: &str,
    direction: Direction,
    signals: &[&IntelligenceSignal],
    confidence: f64,
    llm: Option<&dyn LlmClient>,
) -> String {
    let Some(llm) = llm else {
        return fallback_summary(theme_name, direction, signals.len(), confidence);
    };

    let top_titles: Vec<&str> = signals.iter().take(5).map(|s| s.raw.title.as_str()).collect();
    let system_prompt = "Write a 2-3 sentence plain-English summary of this geopolitical theme's impact.";
    let user_prompt = format!(
        "Theme: {theme_name}. Direction: {}. Asset region/country: {}. Top sources: {:?}",
        direction_word(direction),
        profile.country.as_deref().unwrap_or(&profile.region),
        top_titles
    );

    match llm.complete_with_cascade(system_prompt, &user_prompt).await {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => fallback_summary(theme_name, direction, signals.len(), confidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use georisk_models::signal::{RawSignal, SignalSource};

    fn signal(title: &str, theme: &str) -> IntelligenceSignal {
        let raw = RawSignal {
            source: SignalSource::Web,
            title: title.to_string(),
            summary: String::new(),
            topic: theme.to_string(),
            url: Some(format!("https://reuters.com/{title}")),
            country: Some("Russia".to_string()),
            published_at: "2026-01-01".to_string(),
            activity_level: None,
        };
        let mut signal = IntelligenceSignal::from_raw(raw);
        signal.theme_match = Some(theme.to_string());
        signal.relevance_score = 0.8;
        signal
    }

    fn profile() -> AssetProfile {
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

    #[tokio::test]
    async fn negative_terms_drive_negative_direction() {
        let signals = vec![
            signal("Russia sanctions escalate conflict", "sanctions"),
            signal("New embargo imposed amid tension", "sanctions"),
        ];
        let themes = vec![ThemeRelevance {
            theme: "sanctions".to_string(),
            relevance_score: 0.8,
            reasoning: String::new(),
            keywords_matched: vec![],
        }];
        let aggregate = assess_impact(&profile(), &signals, &themes, None).await;
        assert_eq!(aggregate.theme_impacts.len(), 1);
        assert_eq!(aggregate.theme_impacts[0].direction, Direction::Negative);
    }

    #[tokio::test]
    async fn summary_falls_back_when_no_llm_configured() {
        let signals = vec![signal("Sanctions conflict risk grows", "sanctions")];
        let themes = vec![ThemeRelevance {
            theme: "sanctions".to_string(),
            relevance_score: 0.5,
            reasoning: String::new(),
            keywords_matched: vec![],
        }];
        let aggregate = assess_impact(&profile(), &signals, &themes, None).await;
        assert!(aggregate.theme_impacts[0].summary.contains("sanctions"));
    }

    #[tokio::test]
    async fn signals_without_theme_match_are_dropped() {
        let mut unmatched = signal("No theme here", "none");
        unmatched.theme_match = None;
        let aggregate = assess_impact(&profile(), &[unmatched], &[], None).await;
        assert!(aggregate.theme_impacts.is_empty());
        assert_eq!(aggregate.total_signals, 0);
    }
}
