use chrono::{NaiveDate, NaiveDateTime, Utc};

use georisk_models::settings::ScoringSettings;

/// Accepted `publishedAt` date formats, tried in order (§9's explicit
/// format list; supplements the distillation's unspecified parsing).
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
];

fn parse_published_at(published_at: &str) -> Option<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(published_at, format) {
            return Some(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(published_at, format) {
            return Some(date.and_hms_opt(0, 0, 0).unwrap());
        }
    }
    None
}

/// `recencyScore` (§4.5): exponential decay, 0 if unparsable or older
/// than the lookback window.
pub fn recency_score(published_at: &str, lookback_days: u32, decay_constant: f64) -> f64 {
    let Some(parsed) = parse_published_at(published_at) else {
        return 0.0;
    };
    let now = Utc::now().naive_utc();
    let days_ago = (now - parsed).num_seconds() as f64 / 86_400.0;
    if days_ago < 0.0 || days_ago > lookback_days as f64 {
        return 0.0;
    }
    (-days_ago / decay_constant).exp().clamp(0.0, 1.0)
}

/// `sourceQualityScore` (§4.5): exact, then case-insensitive, then
/// substring match against the settings table; falls back to "default".
pub fn source_quality_score(name: &str, table: &std::collections::HashMap<String, f64>) -> f64 {
    if let Some(score) = table.get(name) {
        return *score;
    }
    let lower = name.to_lowercase();
    if let Some(score) = table.get(&lower) {
        return *score;
    }
    for (key, score) in table {
        if key != "default" && lower.contains(key.as_str()) {
            return *score;
        }
    }
    *table.get("default").unwrap_or(&0.7)
}

/// `activityLevelScore` (§4.5): direct lookup, falling back to "default".
pub fn activity_level_score(level: Option<&str>, table: &std::collections::HashMap<String, f64>) -> f64 {
    let Some(level) = level else {
        return *table.get("default").unwrap_or(&0.3);
    };
    table
        .get(&level.to_lowercase())
        .copied()
        .unwrap_or_else(|| *table.get("default").unwrap_or(&0.3))
}

/// `finalScore` (§4.5): weighted combination. When `activity == 0.0`
/// (non-snapshot sources never carry an activity level), the activity
/// weight is redistributed proportionally across the other four before
/// combining.
pub fn final_score(
    base_relevance: f64,
    theme_match: f64,
    recency: f64,
    source_quality: f64,
    activity: f64,
    settings: &ScoringSettings,
) -> f64 {
    let w = &settings.weights;

    let score = if activity == 0.0 {
        let remaining = w.base_relevance + w.theme_match + w.recency + w.source_quality;
        if remaining <= 0.0 {
            0.0
        } else {
            let redistribute = |weight: f64| weight + weight / remaining * w.activity_level;
            base_relevance * redistribute(w.base_relevance)
                + theme_match * redistribute(w.theme_match)
                + recency * redistribute(w.recency)
                + source_quality * redistribute(w.source_quality)
        }
    } else {
        base_relevance * w.base_relevance
            + theme_match * w.theme_match
            + recency * w.recency
            + source_quality * w.source_quality
            + activity * w.activity_level
    };

    score.clamp(0.0, 1.0)
}
