use rust_decimal::Decimal;

use crate::domain::pricing_config::PricingConfig;
use crate::domain::season::{GuestBracket, MonthSet, Season, SeasonId};
use crate::pricing::legacy::{legacy_months, HIGH_SEASON, LOW_SEASON, MID_SEASON};

pub const DEFAULT_CLEANING_FEE: i64 = 300;
/// Whole percent, as stored.
pub const DEFAULT_DISCOUNT_PERCENT: i64 = 15;
pub const DEFAULT_DISCOUNT_THRESHOLD_NIGHTS: u32 = 7;

/// `(season id, name, [(min, max, nightly rate)])`
const DEFAULT_SEASONS: &[(&str, &str, &[(u32, u32, i64)])] = &[
    ("default-1", HIGH_SEASON, &[(1, 6, 1200), (7, 8, 1500), (9, 10, 1800)]),
    ("default-2", MID_SEASON, &[(1, 6, 900), (7, 8, 1100), (9, 10, 1300)]),
    ("default-3", LOW_SEASON, &[(1, 6, 700), (7, 8, 900), (9, 10, 1100)]),
];

/// Built-in configuration served whenever the pricing store is unavailable.
pub fn fallback_config() -> PricingConfig {
    let seasons = DEFAULT_SEASONS
        .iter()
        .map(|(id, name, rates)| {
            let months = legacy_months(name).unwrap_or(MonthSet::EMPTY);
            rates.iter().fold(
                Season::new(SeasonId((*id).to_string()), *name, months),
                |season, (min, max, rate)| match GuestBracket::new(*min, *max) {
                    Ok(bracket) => season.with_rate(bracket, Decimal::from(*rate)),
                    Err(_) => season,
                },
            )
        })
        .collect();

    PricingConfig::from_trusted_parts(
        Decimal::from(DEFAULT_CLEANING_FEE),
        DEFAULT_DISCOUNT_THRESHOLD_NIGHTS,
        Decimal::new(DEFAULT_DISCOUNT_PERCENT, 2),
        seasons,
    )
}
