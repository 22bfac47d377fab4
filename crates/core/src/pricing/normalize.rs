use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::pricing_config::PricingConfig;
use crate::domain::season::{GuestBracket, MonthSet, Season, SeasonId};
use crate::errors::ConfigUnavailable;
use crate::pricing::defaults::{
    DEFAULT_CLEANING_FEE, DEFAULT_DISCOUNT_PERCENT, DEFAULT_DISCOUNT_THRESHOLD_NIGHTS,
};
use crate::pricing::legacy::legacy_months;
use crate::pricing::source::{
    PricingRows, RuleRow, SeasonRow, SettingRow, CLEANING_FEE_KEY, DISCOUNT_PERCENTAGE_KEY,
    DISCOUNT_THRESHOLD_NIGHTS_KEY,
};
use crate::pricing::validation::validate_config;

/// Builds an immutable snapshot from raw store rows.
///
/// Missing settings fall back to the built-in defaults. Seasons keep store
/// order; a repeated season id replaces the earlier row in place. Rules that
/// reference an unknown season are skipped. Any row that cannot be parsed
/// fails the whole build with `ConfigUnavailable::Malformed`.
pub fn build_pricing_config(rows: PricingRows) -> Result<PricingConfig, ConfigUnavailable> {
    let cleaning_fee =
        setting_decimal(&rows.settings, CLEANING_FEE_KEY, Decimal::from(DEFAULT_CLEANING_FEE))?;
    if cleaning_fee.is_sign_negative() {
        return Err(malformed(format!("{CLEANING_FEE_KEY} is negative ({cleaning_fee})")));
    }

    let discount_percent = setting_decimal(
        &rows.settings,
        DISCOUNT_PERCENTAGE_KEY,
        Decimal::from(DEFAULT_DISCOUNT_PERCENT),
    )?;
    if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
        return Err(malformed(format!(
            "{DISCOUNT_PERCENTAGE_KEY} must be within 0..=100 (got {discount_percent})"
        )));
    }

    let threshold = setting_decimal(
        &rows.settings,
        DISCOUNT_THRESHOLD_NIGHTS_KEY,
        Decimal::from(DEFAULT_DISCOUNT_THRESHOLD_NIGHTS),
    )?;
    let discount_threshold_nights = threshold
        .fract()
        .is_zero()
        .then(|| threshold.to_u32())
        .flatten()
        .ok_or_else(|| {
            malformed(format!(
                "{DISCOUNT_THRESHOLD_NIGHTS_KEY} must be a whole number of nights (got {threshold})"
            ))
        })?;

    let mut seasons: Vec<Season> = Vec::with_capacity(rows.seasons.len());
    for row in &rows.seasons {
        let season = season_from_row(row)?;
        match seasons.iter_mut().find(|existing| existing.id == season.id) {
            Some(existing) => *existing = season,
            None => seasons.push(season),
        }
    }

    for rule in &rows.rules {
        apply_rule(&mut seasons, rule)?;
    }

    let config = PricingConfig::new(
        cleaning_fee,
        discount_threshold_nights,
        discount_percent / Decimal::ONE_HUNDRED,
        seasons,
    )
    .map_err(|error| malformed(error.to_string()))?;

    for warning in validate_config(&config) {
        warn!(
            event_name = "pricing.config.validation_warning",
            warning = %warning,
            "pricing configuration warning"
        );
    }

    Ok(config)
}

fn setting_decimal(
    settings: &[SettingRow],
    key: &str,
    default: Decimal,
) -> Result<Decimal, ConfigUnavailable> {
    match settings.iter().find(|setting| setting.key == key) {
        Some(setting) => Decimal::from_str(setting.value.trim()).map_err(|_| {
            malformed(format!("setting `{key}` is not a number: `{}`", setting.value))
        }),
        None => {
            debug!(event_name = "pricing.config.setting_defaulted", key, %default, "setting missing");
            Ok(default)
        }
    }
}

fn season_from_row(row: &SeasonRow) -> Result<Season, ConfigUnavailable> {
    let months = match legacy_months(&row.name) {
        Some(months) => months,
        None => {
            let start = month_from_column(row, "start_month", row.start_month)?;
            let end = month_from_column(row, "end_month", row.end_month)?;
            MonthSet::span(start, end).map_err(|error| malformed(error.to_string()))?
        }
    };

    Ok(Season::new(SeasonId(row.id.clone()), row.name.clone(), months))
}

fn month_from_column(row: &SeasonRow, column: &str, value: i64) -> Result<u32, ConfigUnavailable> {
    u32::try_from(value)
        .ok()
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| malformed(format!("season `{}` has {column} {value}", row.id)))
}

fn apply_rule(seasons: &mut [Season], rule: &RuleRow) -> Result<(), ConfigUnavailable> {
    let Some(season) = seasons.iter_mut().find(|season| season.id.0 == rule.season_id) else {
        warn!(
            event_name = "pricing.config.orphan_rule",
            rule_id = %rule.id,
            season_id = %rule.season_id,
            "rule references an unknown season; skipped"
        );
        return Ok(());
    };

    let bracket = u32::try_from(rule.min_guests)
        .ok()
        .zip(u32::try_from(rule.max_guests).ok())
        .and_then(|(min, max)| GuestBracket::new(min, max).ok())
        .ok_or_else(|| {
            malformed(format!(
                "rule `{}` has invalid guest range {}-{}",
                rule.id, rule.min_guests, rule.max_guests
            ))
        })?;

    if rule.price_per_night.is_sign_negative() {
        return Err(malformed(format!(
            "rule `{}` has negative price {}",
            rule.id, rule.price_per_night
        )));
    }

    season.set_rate(bracket, rule.price_per_night);
    Ok(())
}

fn malformed(message: String) -> ConfigUnavailable {
    ConfigUnavailable::Malformed(message)
}
