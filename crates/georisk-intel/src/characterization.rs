use georisk_models::asset_profile::{
    AssetProfile, DEVELOPED_MARKETS, EMERGING_MARKETS, ENERGY_SECTORS, FINANCIAL_SECTORS,
    GOVERNMENT_SECTORS, INFRASTRUCTURE_SECTORS, NON_SECTOR_SPECIFIC, TECHNOLOGY_SECTORS,
};
use georisk_models::holding::Holding;

/// Pure stage-1 function: `Holding` → `AssetProfile` (§4.3). No I/O, no
/// randomness — every flag is derived from the holding's own fields.
pub fn characterize(holding: &Holding) -> AssetProfile {
    let mut profile = AssetProfile::from_holding(holding);

    let country = holding.country.as_deref();

    profile.emerging_market = country.is_some_and(|c| EMERGING_MARKETS.contains(&c));
    profile.developed_market = country.is_some_and(|c| DEVELOPED_MARKETS.contains(&c));
    profile.global_fund = matches!(country, None | Some("Global")) || holding.region == "Global";

    let sector = holding.sector.as_str();
    profile.energy_exposed = ENERGY_SECTORS.contains(&sector);
    profile.financial_exposed = FINANCIAL_SECTORS.contains(&sector);
    profile.technology_exposed = TECHNOLOGY_SECTORS.contains(&sector);
    profile.infrastructure_exposed = INFRASTRUCTURE_SECTORS.contains(&sector);
    profile.government_exposed = GOVERNMENT_SECTORS.contains(&sector)
        || (holding.asset_class == "Fixed Income" && holding.name.contains("Treasury"))
        || holding.name.contains("Government");

    profile.sector_specific = !NON_SECTOR_SPECIFIC.contains(&sector);
    profile.country_specific = country.is_some_and(|c| !c.is_empty() && c != "Global");

    profile
}
