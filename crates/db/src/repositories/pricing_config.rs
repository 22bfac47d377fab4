use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;

use stayrate_core::domain::pricing_config::PricingConfig;
use stayrate_core::errors::ConfigUnavailable;
use stayrate_core::pricing::normalize::build_pricing_config;
use stayrate_core::pricing::source::{
    PricingConfigSource, PricingRows, RuleRow, SeasonRow, SettingRow,
};

use super::RepositoryError;
use crate::DbPool;

/// Reads the three pricing tables. Rows come back in insertion order so
/// "second season" keeps meaning the second season an administrator created.
pub struct SqlPricingConfigSource {
    pool: DbPool,
}

impl SqlPricingConfigSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn load_rows(&self) -> Result<PricingRows, RepositoryError> {
        let settings = sqlx::query(
            "SELECT key, CAST(value AS TEXT) AS value_text FROM pricing_config ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(Self::setting_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let seasons = sqlx::query(
            "SELECT id, name, start_month, end_month, color FROM pricing_seasons ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(Self::season_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let rules = sqlx::query(
            r#"
            SELECT
                id,
                season_id,
                min_guests,
                max_guests,
                CAST(price_per_night AS TEXT) AS price_text
            FROM pricing_rules
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(Self::rule_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        debug!(
            event_name = "pricing.store.loaded",
            settings = settings.len(),
            seasons = seasons.len(),
            rules = rules.len(),
            "pricing rows loaded"
        );

        Ok(PricingRows { settings, seasons, rules })
    }

    fn setting_from_row(row: &SqliteRow) -> Result<SettingRow, RepositoryError> {
        Ok(SettingRow { key: row.try_get("key")?, value: row.try_get("value_text")? })
    }

    fn season_from_row(row: &SqliteRow) -> Result<SeasonRow, RepositoryError> {
        Ok(SeasonRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            start_month: row.try_get("start_month")?,
            end_month: row.try_get("end_month")?,
            color: row.try_get("color")?,
        })
    }

    fn rule_from_row(row: &SqliteRow) -> Result<RuleRow, RepositoryError> {
        let id: String = row.try_get("id")?;
        let price_text: String = row.try_get("price_text")?;
        let price_per_night = parse_decimal(&format!("rule `{id}` price_per_night"), &price_text)?;
        Ok(RuleRow {
            id,
            price_per_night,
            season_id: row.try_get("season_id")?,
            min_guests: row.try_get("min_guests")?,
            max_guests: row.try_get("max_guests")?,
        })
    }
}

#[async_trait]
impl PricingConfigSource for SqlPricingConfigSource {
    async fn fetch_config(&self) -> Result<PricingConfig, ConfigUnavailable> {
        let rows = self.load_rows().await?;
        build_pricing_config(rows)
    }
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim())
        .or_else(|_| Decimal::from_scientific(value.trim()))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid decimal value for {field}: {error}"))
        })
}
