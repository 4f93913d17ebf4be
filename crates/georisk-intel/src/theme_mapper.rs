use georisk_models::asset_profile::AssetProfile;
use georisk_models::theme::{
    ThemeDefinition, ThemeRelevance, CURRENCY_VOLATILITY, ENERGY_SECURITY, POLITICAL_INSTABILITY,
    SUPPLY_CHAIN_RISK, TRADE_DISRUPTION,
};

const EMERGING_BONUS_THEMES: &[&str] = &[CURRENCY_VOLATILITY, POLITICAL_INSTABILITY, TRADE_DISRUPTION];

/// Stage 2: scores every theme definition against a profile, keeps those
/// clearing their own threshold, sorts descending by score (§4.4).
pub fn map_themes(profile: &AssetProfile, catalog: &[ThemeDefinition]) -> Vec<ThemeRelevance> {
    let mut relevances: Vec<ThemeRelevance> = catalog
        .iter()
        .filter(|theme| theme.active)
        .filter_map(|theme| score_theme(profile, theme))
        .collect();

    relevances.sort_by(|a, b| b.relevance_score.partial_cmp(&a.relevance_score).unwrap());
    relevances
}

fn score_theme(profile: &AssetProfile, theme: &ThemeDefinition) -> Option<ThemeRelevance> {
    let mut score = 0.0;
    let mut matched = Vec::new();

    if profile
        .country
        .as_deref()
        .is_some_and(|c| theme.relevant_countries.iter().any(|rc| rc == c))
    {
        score += theme.weights.country;
        matched.push("country".to_string());
    }

    if theme.relevant_regions.iter().any(|r| r == &profile.region) {
        score += theme.weights.region;
        matched.push("region".to_string());
    }

    if theme.relevant_sectors.iter().any(|s| s == &profile.sector) {
        score += theme.weights.sector;
        matched.push("sector".to_string());
    }

    if (theme.name == ENERGY_SECURITY && profile.energy_exposed)
        || (theme.name == POLITICAL_INSTABILITY && profile.government_exposed)
    {
        score += theme.weights.exposure_bonus;
        matched.push("exposure".to_string());
    } else if (theme.name == CURRENCY_VOLATILITY && profile.financial_exposed)
        || (theme.name == SUPPLY_CHAIN_RISK && profile.technology_exposed)
    {
        score += theme.weights.exposure_bonus * 0.667;
        matched.push("exposure".to_string());
    }

    if profile.emerging_market && EMERGING_BONUS_THEMES.contains(&theme.name.as_str()) {
        score += theme.weights.emerging_bonus;
        matched.push("emerging-market".to_string());
    }

    let score = score.min(1.0);
    if score < theme.min_relevance_threshold {
        return None;
    }

    Some(ThemeRelevance {
        theme: theme.name.clone(),
        relevance_score: score,
        reasoning: reasoning_sentence(&theme.display_name, &matched),
        keywords_matched: matched,
    })
}

fn reasoning_sentence(display_name: &str, matched: &[String]) -> String {
    if matched.is_empty() {
        format!("{display_name}: no matched dimensions")
    } else {
        format!("{display_name}: matched on {}", matched.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use georisk_models::holding::Holding;
    use georisk_models::theme::default_catalog;

    fn profile(country: Option<&str>, region: &str, sector: &str, emerging: bool) -> AssetProfile {
        let holding = Holding {
            id: uuid::Uuid::nil(),
            name: "Test".to_string(),
            ticker: None,
            isin: None,
            country: country.map(|s| s.to_string()),
            region: region.to_string(),
            sub_region: None,
            sector: sector.to_string(),
            asset_class: "Equity".to_string(),
            asset_type: "ETF".to_string(),
            value: 1.0,
            allocation_pct: 1.0,
            currency: "USD".to_string(),
        };
        let mut profile = AssetProfile::from_holding(&holding);
        profile.emerging_market = emerging;
        profile
    }

    #[test]
    fn russia_energy_scores_sanctions_and_energy_security() {
        let mut p = profile(Some("Russia"), "Europe", "Energy", true);
        p.energy_exposed = true;
        let themes = map_themes(&p, &default_catalog());
        let names: Vec<&str> = themes.iter().map(|t| t.theme.as_str()).collect();
        assert!(names.contains(&"sanctions"));
        assert!(names.contains(&"energy_security"));
    }

    #[test]
    fn results_are_sorted_descending() {
        let mut p = profile(Some("Russia"), "Europe", "Energy", true);
        p.energy_exposed = true;
        p.financial_exposed = true;
        let themes = map_themes(&p, &default_catalog());
        for window in themes.windows(2) {
            assert!(window[0].relevance_score >= window[1].relevance_score);
        }
    }

    #[test]
    fn irrelevant_profile_yields_no_themes_above_threshold() {
        let p = profile(None, "Unknown Region", "Diversified", false);
        let themes = map_themes(&p, &default_catalog());
        assert!(themes.is_empty());
    }

    #[test]
    fn score_never_exceeds_one() {
        let mut p = profile(Some("Russia"), "Europe", "Energy", true);
        p.energy_exposed = true;
        p.government_exposed = true;
        for theme in map_themes(&p, &default_catalog()) {
            assert!(theme.relevance_score <= 1.0);
        }
    }
}
