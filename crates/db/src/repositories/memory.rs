use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use stayrate_core::domain::pricing_config::PricingConfig;
use stayrate_core::errors::{AdminError, ConfigUnavailable};
use stayrate_core::pricing::admin::PricingConfigWriter;
use stayrate_core::pricing::normalize::build_pricing_config;
use stayrate_core::pricing::source::{
    PricingConfigSource, PricingRows, RuleRow, SeasonRow, SettingRow,
};

/// Pricing store held in process memory. Serves both the read and write
/// contracts so tests and dry runs can exercise the engine without SQLite.
#[derive(Default)]
pub struct InMemoryPricingStore {
    rows: RwLock<PricingRows>,
}

impl InMemoryPricingStore {
    pub fn with_rows(rows: PricingRows) -> Self {
        Self { rows: RwLock::new(rows) }
    }

    pub async fn rows(&self) -> PricingRows {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl PricingConfigSource for InMemoryPricingStore {
    async fn fetch_config(&self) -> Result<PricingConfig, ConfigUnavailable> {
        let rows = self.rows.read().await.clone();
        build_pricing_config(rows)
    }
}

#[async_trait]
impl PricingConfigWriter for InMemoryPricingStore {
    async fn upsert_setting(&self, key: &str, value: Decimal) -> Result<(), AdminError> {
        let mut rows = self.rows.write().await;
        let value = value.to_string();
        match rows.settings.iter_mut().find(|setting| setting.key == key) {
            Some(setting) => setting.value = value,
            None => rows.settings.push(SettingRow { key: key.to_string(), value }),
        }
        Ok(())
    }

    async fn upsert_settings(&self, settings: &[(&str, Decimal)]) -> Result<(), AdminError> {
        let mut rows = self.rows.write().await;
        for (key, value) in settings {
            let value = value.to_string();
            match rows.settings.iter_mut().find(|setting| setting.key == *key) {
                Some(setting) => setting.value = value,
                None => rows.settings.push(SettingRow { key: key.to_string(), value }),
            }
        }
        Ok(())
    }

    async fn update_rule_price(&self, rule_id: &str, price: Decimal) -> Result<bool, AdminError> {
        let mut rows = self.rows.write().await;
        Ok(rows
            .rules
            .iter_mut()
            .find(|rule| rule.id == rule_id)
            .map(|rule| rule.price_per_night = price)
            .is_some())
    }

    async fn upsert_season(&self, season: SeasonRow) -> Result<(), AdminError> {
        let mut rows = self.rows.write().await;
        match rows.seasons.iter_mut().find(|existing| existing.id == season.id) {
            Some(existing) => *existing = season,
            None => rows.seasons.push(season),
        }
        Ok(())
    }

    async fn upsert_rule(&self, rule: RuleRow) -> Result<(), AdminError> {
        let mut rows = self.rows.write().await;
        if !rows.seasons.iter().any(|season| season.id == rule.season_id) {
            return Err(AdminError::Store(format!("season `{}` does not exist", rule.season_id)));
        }
        match rows.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rows.rules.push(rule),
        }
        Ok(())
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<bool, AdminError> {
        let mut rows = self.rows.write().await;
        let before = rows.rules.len();
        rows.rules.retain(|rule| rule.id != rule_id);
        Ok(rows.rules.len() < before)
    }
}
