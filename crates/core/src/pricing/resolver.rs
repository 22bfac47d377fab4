use chrono::{Datelike, NaiveDate};

use crate::domain::pricing_config::PricingConfig;
use crate::domain::season::Season;

/// Season owning `date`'s calendar month. Seasons are scanned in
/// configuration order and the first owner wins. A month owned by no season
/// falls back to the second configured season, else the first.
pub fn resolve_season(date: NaiveDate, config: &PricingConfig) -> Option<&Season> {
    resolve_month(date.month(), config)
}

pub fn resolve_month(month: u32, config: &PricingConfig) -> Option<&Season> {
    let seasons = config.seasons();
    seasons
        .iter()
        .find(|season| season.owns_month(month))
        .or_else(|| seasons.get(1))
        .or_else(|| seasons.first())
}
