use serde::{Deserialize, Serialize};

use crate::holding::Holding;

/// Countries treated as emerging markets (§4.3).
pub const EMERGING_MARKETS: &[&str] = &[
    "Russia",
    "China",
    "India",
    "Brazil",
    "Turkey",
    "South Africa",
    "Mexico",
    "Indonesia",
    "Thailand",
    "Philippines",
    "Vietnam",
    "Argentina",
    "Chile",
    "Colombia",
    "Egypt",
    "Nigeria",
    "Pakistan",
    "Poland",
    "Czech Republic",
    "Hungary",
    "Romania",
    "Bulgaria",
];

/// Countries treated as developed markets (§4.3).
pub const DEVELOPED_MARKETS: &[&str] = &[
    "United States",
    "United Kingdom",
    "Germany",
    "France",
    "Japan",
    "Canada",
    "Australia",
    "Switzerland",
    "Netherlands",
    "Sweden",
    "Norway",
    "Denmark",
    "Finland",
    "Belgium",
    "Austria",
    "Italy",
    "Spain",
    "Singapore",
    "Hong Kong",
    "South Korea",
    "New Zealand",
];

pub const ENERGY_SECTORS: &[&str] = &["Energy", "Oil", "Gas", "Utilities"];
pub const FINANCIAL_SECTORS: &[&str] = &["Financials", "Banking", "Insurance"];
pub const TECHNOLOGY_SECTORS: &[&str] = &["Technology", "Software", "Hardware", "Semiconductors"];
pub const INFRASTRUCTURE_SECTORS: &[&str] =
    &["Infrastructure", "Utilities", "Transportation", "Real Estate"];
pub const GOVERNMENT_SECTORS: &[&str] = &["Government", "Sovereign"];

pub const NON_SECTOR_SPECIFIC: &[&str] = &["Diversified", "Cash", "General"];

/// Derived, immutable characterization of a Holding. Built once by
/// `georisk_intel::characterization::characterize` and passed downstream read-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetProfile {
    pub id: uuid::Uuid,
    pub name: String,
    pub ticker: Option<String>,
    pub isin: Option<String>,
    pub country: Option<String>,
    pub region: String,
    pub sub_region: Option<String>,
    pub sector: String,
    pub asset_class: String,
    pub asset_type: String,
    pub value: f64,
    pub allocation_pct: f64,
    pub currency: String,

    pub emerging_market: bool,
    pub developed_market: bool,
    pub global_fund: bool,
    pub sector_specific: bool,
    pub country_specific: bool,
    pub government_exposed: bool,
    pub energy_exposed: bool,
    pub financial_exposed: bool,
    pub technology_exposed: bool,
    pub infrastructure_exposed: bool,
}

impl AssetProfile {
    pub fn from_holding(holding: &Holding) -> Self {
        Self {
            id: holding.id,
            name: holding.name.clone(),
            ticker: holding.ticker.clone(),
            isin: holding.isin.clone(),
            country: holding.country.clone(),
            region: holding.region.clone(),
            sub_region: holding.sub_region.clone(),
            sector: holding.sector.clone(),
            asset_class: holding.asset_class.clone(),
            asset_type: holding.asset_type.clone(),
            value: holding.value,
            allocation_pct: holding.allocation_pct,
            currency: holding.currency.clone(),
            emerging_market: false,
            developed_market: false,
            global_fund: false,
            sector_specific: false,
            country_specific: false,
            government_exposed: false,
            energy_exposed: false,
            financial_exposed: false,
            technology_exposed: false,
            infrastructure_exposed: false,
        }
    }

    /// Short human-readable sentence describing the profile. Supplemental
    /// helper carried over from the original narrative-summary routine;
    /// never consumed by downstream stages.
    pub fn characterization_summary(&self) -> String {
        let mut descriptors = Vec::new();
        if self.emerging_market {
            descriptors.push("emerging-market");
        }
        if self.developed_market {
            descriptors.push("developed-market");
        }
        if self.global_fund {
            descriptors.push("global");
        }
        if self.energy_exposed {
            descriptors.push("energy-exposed");
        }
        if self.financial_exposed {
            descriptors.push("financial-exposed");
        }
        if self.technology_exposed {
            descriptors.push("technology-exposed");
        }
        if self.infrastructure_exposed {
            descriptors.push("infrastructure-exposed");
        }
        if self.government_exposed {
            descriptors.push("government-exposed");
        }
        if self.country_specific {
            descriptors.push("country-specific");
        }

        let where_clause = match &self.country {
            Some(country) => format!(" in {country}"),
            None => String::new(),
        };

        if descriptors.is_empty() {
            format!("Diversified holding{where_clause}")
        } else {
            format!("{} holding{}", descriptors.join(", "), where_clause)
        }
    }
}
