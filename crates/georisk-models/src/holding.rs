use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single asset position described to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    pub id: Uuid,
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
}

impl Holding {
    /// Empty region is the one InputError condition surfaced from stage 1.
    pub fn validate(&self) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("holding.region must not be empty".to_string());
        }
        if !(0.0..=100.0).contains(&self.allocation_pct) {
            return Err(format!(
                "holding.allocation_pct must be within [0, 100], got {}",
                self.allocation_pct
            ));
        }
        Ok(())
    }

    pub fn country_or_region(&self) -> &str {
        self.country.as_deref().unwrap_or(&self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Holding {
        Holding {
            id: Uuid::nil(),
            name: "Test Holding".to_string(),
            ticker: None,
            isin: None,
            country: Some("Russia".to_string()),
            region: "Europe".to_string(),
            sub_region: None,
            sector: "Energy".to_string(),
            asset_class: "Equity".to_string(),
            asset_type: "ETF".to_string(),
            value: 1000.0,
            allocation_pct: 5.0,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn rejects_empty_region() {
        let mut h = base();
        h.region = "  ".to_string();
        assert!(h.validate().is_err());
    }

    #[test]
    fn rejects_out_of_bounds_allocation() {
        let mut h = base();
        h.allocation_pct = 120.0;
        assert!(h.validate().is_err());
    }

    #[test]
    fn accepts_valid_holding() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn country_or_region_prefers_country() {
        assert_eq!(base().country_or_region(), "Russia");
    }
}
