use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pricing_config::PricingConfig;
use crate::errors::ConfigUnavailable;

pub const CLEANING_FEE_KEY: &str = "cleaning_fee";
/// Stored as whole percent (`15` means 15%).
pub const DISCOUNT_PERCENTAGE_KEY: &str = "discount_percentage";
pub const DISCOUNT_THRESHOLD_NIGHTS_KEY: &str = "discount_threshold_nights";

/// One `pricing_config` key/value row. Values are kept as the raw text the
/// store returned and parsed during normalization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRow {
    pub id: String,
    pub name: String,
    pub start_month: i64,
    pub end_month: i64,
    /// Display only.
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    pub id: String,
    pub season_id: String,
    pub min_guests: i64,
    pub max_guests: i64,
    pub price_per_night: Decimal,
}

/// The three record sets the engine reads, in store order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRows {
    pub settings: Vec<SettingRow>,
    pub seasons: Vec<SeasonRow>,
    pub rules: Vec<RuleRow>,
}

/// Read side of the pricing store.
#[async_trait]
pub trait PricingConfigSource: Send + Sync {
    async fn fetch_config(&self) -> Result<PricingConfig, ConfigUnavailable>;
}

#[async_trait]
impl<T> PricingConfigSource for std::sync::Arc<T>
where
    T: PricingConfigSource + ?Sized,
{
    async fn fetch_config(&self) -> Result<PricingConfig, ConfigUnavailable> {
        (**self).fetch_config().await
    }
}
