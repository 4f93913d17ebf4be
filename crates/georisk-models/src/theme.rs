use serde::{Deserialize, Serialize};

/// Per-theme weight table used by the theme mapper (§4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThemeWeights {
    pub country: f64,
    pub region: f64,
    pub sector: f64,
    pub exposure_bonus: f64,
    pub emerging_bonus: f64,
}

/// A single entry in the theme catalog (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeDefinition {
    pub name: String,
    pub display_name: String,
    pub keywords: Vec<String>,
    pub relevant_countries: Vec<String>,
    pub relevant_regions: Vec<String>,
    pub relevant_sectors: Vec<String>,
    pub weights: ThemeWeights,
    pub min_relevance_threshold: f64,
    pub active: bool,
}

/// Stage 2 output: a theme with a score high enough to surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeRelevance {
    pub theme: String,
    pub relevance_score: f64,
    pub reasoning: String,
    pub keywords_matched: Vec<String>,
}

/// Identifiers of the built-in default catalog (§4.2).
pub const SANCTIONS: &str = "sanctions";
pub const TRADE_DISRUPTION: &str = "trade_disruption";
pub const POLITICAL_INSTABILITY: &str = "political_instability";
pub const CURRENCY_VOLATILITY: &str = "currency_volatility";
pub const ENERGY_SECURITY: &str = "energy_security";
pub const REGIONAL_CONFLICT: &str = "regional_conflict";
pub const REGULATORY_CHANGES: &str = "regulatory_changes";
pub const SUPPLY_CHAIN_RISK: &str = "supply_chain_risk";

fn weights(country: f64, region: f64, sector: f64, exposure_bonus: f64, emerging_bonus: f64) -> ThemeWeights {
    ThemeWeights {
        country,
        region,
        sector,
        exposure_bonus,
        emerging_bonus,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The built-in, eight-theme default catalog. Used when the persisted
/// catalog is empty or has no active records (§4.2).
pub fn default_catalog() -> Vec<ThemeDefinition> {
    vec![
        ThemeDefinition {
            name: SANCTIONS.to_string(),
            display_name: "Sanctions Risk".to_string(),
            keywords: strings(&[
                "sanction",
                "embargo",
                "export control",
                "asset freeze",
                "blacklist",
                "trade restriction",
            ]),
            relevant_countries: strings(&["Russia", "Iran", "North Korea", "Venezuela", "Belarus"]),
            relevant_regions: strings(&["Europe", "Middle East"]),
            relevant_sectors: strings(&["Energy", "Financials", "Defense"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: TRADE_DISRUPTION.to_string(),
            display_name: "Trade Disruption".to_string(),
            keywords: strings(&[
                "tariff",
                "trade war",
                "export ban",
                "supply disruption",
                "customs",
                "trade deal",
            ]),
            relevant_countries: strings(&["China", "United States", "Mexico"]),
            relevant_regions: strings(&["Asia", "Americas"]),
            relevant_sectors: strings(&["Technology", "Manufacturing", "Agriculture"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: POLITICAL_INSTABILITY.to_string(),
            display_name: "Political Instability".to_string(),
            keywords: strings(&[
                "coup",
                "protest",
                "unrest",
                "election crisis",
                "government collapse",
                "civil unrest",
            ]),
            relevant_countries: strings(&["Turkey", "Egypt", "Nigeria", "Pakistan", "Thailand"]),
            relevant_regions: strings(&["Middle East", "Africa", "Latin America"]),
            relevant_sectors: strings(&["Government", "Financials"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: CURRENCY_VOLATILITY.to_string(),
            display_name: "Currency Volatility".to_string(),
            keywords: strings(&[
                "devaluation",
                "currency crisis",
                "peg",
                "central bank intervention",
                "exchange rate",
                "capital controls",
            ]),
            relevant_countries: strings(&["Turkey", "Argentina", "Brazil", "South Africa"]),
            relevant_regions: strings(&["Emerging Markets", "Latin America"]),
            relevant_sectors: strings(&["Financials", "Banking"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: ENERGY_SECURITY.to_string(),
            display_name: "Energy Security".to_string(),
            keywords: strings(&[
                "pipeline",
                "oil supply",
                "gas shortage",
                "opec",
                "energy crisis",
                "refinery",
            ]),
            relevant_countries: strings(&["Russia", "Saudi Arabia", "Iran", "Venezuela"]),
            relevant_regions: strings(&["Middle East", "Europe"]),
            relevant_sectors: strings(&["Energy", "Oil", "Gas", "Utilities"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: REGIONAL_CONFLICT.to_string(),
            display_name: "Regional Conflict".to_string(),
            keywords: strings(&[
                "war",
                "invasion",
                "military conflict",
                "border dispute",
                "armed clash",
                "ceasefire",
            ]),
            relevant_countries: strings(&["Russia", "Ukraine", "Israel", "Taiwan"]),
            relevant_regions: strings(&["Europe", "Middle East", "Asia"]),
            relevant_sectors: strings(&["Defense", "Energy"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: REGULATORY_CHANGES.to_string(),
            display_name: "Regulatory Changes".to_string(),
            keywords: strings(&[
                "regulation",
                "antitrust",
                "compliance",
                "policy change",
                "new law",
                "regulatory crackdown",
            ]),
            relevant_countries: strings(&["China", "United States", "Germany"]),
            relevant_regions: strings(&["Europe", "Asia"]),
            relevant_sectors: strings(&["Technology", "Financials", "Healthcare"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
        ThemeDefinition {
            name: SUPPLY_CHAIN_RISK.to_string(),
            display_name: "Supply Chain Risk".to_string(),
            keywords: strings(&[
                "supply chain",
                "semiconductor shortage",
                "shipping delay",
                "logistics disruption",
                "factory shutdown",
            ]),
            relevant_countries: strings(&["China", "Taiwan", "Vietnam"]),
            relevant_regions: strings(&["Asia"]),
            relevant_sectors: strings(&["Technology", "Semiconductors", "Manufacturing"]),
            weights: weights(0.4, 0.2, 0.3, 0.3, 0.1),
            min_relevance_threshold: 0.1,
            active: true,
        },
    ]
}
