use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::season::{GuestBracket, MonthSet};
use crate::errors::AdminError;
use crate::pricing::cache::PricingConfigCache;
use crate::pricing::source::{
    PricingConfigSource, RuleRow, SeasonRow, CLEANING_FEE_KEY, DISCOUNT_PERCENTAGE_KEY,
    DISCOUNT_THRESHOLD_NIGHTS_KEY,
};

/// Flat settings as an administrator edits them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    pub cleaning_fee: Decimal,
    /// Whole percent, `15` for 15%.
    pub discount_percent: Decimal,
    pub discount_threshold_nights: u32,
}

/// Write side of the pricing store.
#[async_trait]
pub trait PricingConfigWriter: Send + Sync {
    async fn upsert_setting(&self, key: &str, value: Decimal) -> Result<(), AdminError>;

    /// Writes the settings in order. Stores that can apply them atomically
    /// should override this; the default stops at the first failure and
    /// leaves earlier keys written.
    async fn upsert_settings(&self, settings: &[(&str, Decimal)]) -> Result<(), AdminError> {
        for (key, value) in settings {
            self.upsert_setting(key, *value).await?;
        }
        Ok(())
    }

    /// Returns `false` when no rule has `rule_id`.
    async fn update_rule_price(&self, rule_id: &str, price: Decimal) -> Result<bool, AdminError>;

    async fn upsert_season(&self, season: SeasonRow) -> Result<(), AdminError>;

    async fn upsert_rule(&self, rule: RuleRow) -> Result<(), AdminError>;

    /// Returns `false` when no rule has `rule_id`.
    async fn delete_rule(&self, rule_id: &str) -> Result<bool, AdminError>;
}

/// Admin pricing edits. Each successful write invalidates the shared cache so
/// the booking widget prices with the new values on its next request.
pub struct PricingAdmin<W, S> {
    writer: W,
    cache: Arc<PricingConfigCache<S>>,
}

impl<W, S> PricingAdmin<W, S>
where
    W: PricingConfigWriter,
    S: PricingConfigSource,
{
    pub fn new(writer: W, cache: Arc<PricingConfigCache<S>>) -> Self {
        Self { writer, cache }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub async fn save_settings(&self, settings: PricingSettings) -> Result<(), AdminError> {
        if settings.cleaning_fee.is_sign_negative() {
            return Err(AdminError::Validation("cleaning fee must not be negative".to_string()));
        }
        if settings.discount_percent < Decimal::ZERO
            || settings.discount_percent > Decimal::ONE_HUNDRED
        {
            return Err(AdminError::Validation(
                "discount percentage must be within 0..=100".to_string(),
            ));
        }

        let values = [
            (CLEANING_FEE_KEY, settings.cleaning_fee),
            (DISCOUNT_PERCENTAGE_KEY, settings.discount_percent),
            (DISCOUNT_THRESHOLD_NIGHTS_KEY, Decimal::from(settings.discount_threshold_nights)),
        ];
        if let Err(error) = self.writer.upsert_settings(&values).await {
            // Some keys may have landed before the failure.
            warn!(
                event_name = "pricing.admin.save_failed",
                change = "settings",
                error = %error,
                "settings save failed; dropping cached snapshot"
            );
            self.cache.invalidate().await;
            return Err(error);
        }

        self.written("settings").await;
        Ok(())
    }

    pub async fn update_rule_price(&self, rule_id: &str, price: Decimal) -> Result<(), AdminError> {
        check_price(price)?;
        if !self.writer.update_rule_price(rule_id, price).await? {
            return Err(AdminError::NotFound(format!("pricing rule `{rule_id}`")));
        }
        self.written("rule_price").await;
        Ok(())
    }

    pub async fn save_season(&self, season: SeasonRow) -> Result<(), AdminError> {
        if season.name.trim().is_empty() {
            return Err(AdminError::Validation("season name must not be empty".to_string()));
        }
        let start = u32::try_from(season.start_month).unwrap_or(0);
        let end = u32::try_from(season.end_month).unwrap_or(0);
        MonthSet::span(start, end).map_err(|error| AdminError::Validation(error.to_string()))?;

        self.writer.upsert_season(season).await?;
        self.written("season").await;
        Ok(())
    }

    pub async fn save_rule(&self, rule: RuleRow) -> Result<(), AdminError> {
        let min = u32::try_from(rule.min_guests).unwrap_or(0);
        let max = u32::try_from(rule.max_guests).unwrap_or(0);
        GuestBracket::new(min, max).map_err(|error| AdminError::Validation(error.to_string()))?;
        check_price(rule.price_per_night)?;

        self.writer.upsert_rule(rule).await?;
        self.written("rule").await;
        Ok(())
    }

    pub async fn delete_rule(&self, rule_id: &str) -> Result<(), AdminError> {
        if !self.writer.delete_rule(rule_id).await? {
            return Err(AdminError::NotFound(format!("pricing rule `{rule_id}`")));
        }
        self.written("rule_deleted").await;
        Ok(())
    }

    async fn written(&self, change: &'static str) {
        info!(event_name = "pricing.admin.saved", change, "pricing configuration changed");
        self.cache.invalidate().await;
    }
}

fn check_price(price: Decimal) -> Result<(), AdminError> {
    if price.is_sign_negative() {
        return Err(AdminError::Validation("nightly price must not be negative".to_string()));
    }
    Ok(())
}
