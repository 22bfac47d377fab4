use async_trait::async_trait;
use rust_decimal::Decimal;

use stayrate_core::errors::AdminError;
use stayrate_core::pricing::admin::PricingConfigWriter;
use stayrate_core::pricing::source::{RuleRow, SeasonRow};

use super::RepositoryError;
use crate::DbPool;

const UPSERT_SETTING: &str = r#"
    INSERT INTO pricing_config (key, value, description, updated_at)
    VALUES (?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    ON CONFLICT (key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

pub struct SqlPricingAdminRepository {
    pool: DbPool,
}

impl SqlPricingAdminRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn id_or_new(id: String, prefix: &str) -> String {
        if id.trim().is_empty() {
            format!("{prefix}-{}", uuid::Uuid::new_v4())
        } else {
            id
        }
    }
}

#[async_trait]
impl PricingConfigWriter for SqlPricingAdminRepository {
    async fn upsert_setting(&self, key: &str, value: Decimal) -> Result<(), AdminError> {
        sqlx::query(UPSERT_SETTING)
            .bind(key)
            .bind(value.to_string())
            .bind(format!("pricing setting {key}"))
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn upsert_settings(&self, settings: &[(&str, Decimal)]) -> Result<(), AdminError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        for (key, value) in settings {
            sqlx::query(UPSERT_SETTING)
                .bind(*key)
                .bind(value.to_string())
                .bind(format!("pricing setting {key}"))
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::from)?;
        }
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn update_rule_price(&self, rule_id: &str, price: Decimal) -> Result<bool, AdminError> {
        let result = sqlx::query(
            "UPDATE pricing_rules
             SET price_per_night = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
             WHERE id = ?",
        )
        .bind(price.to_string())
        .bind(rule_id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_season(&self, season: SeasonRow) -> Result<(), AdminError> {
        let id = Self::id_or_new(season.id, "season");
        sqlx::query(
            r#"
            INSERT INTO pricing_seasons (id, name, start_month, end_month, color, updated_at)
            VALUES (?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                start_month = excluded.start_month,
                end_month = excluded.end_month,
                color = excluded.color,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(season.name)
        .bind(season.start_month)
        .bind(season.end_month)
        .bind(season.color)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn upsert_rule(&self, rule: RuleRow) -> Result<(), AdminError> {
        let id = Self::id_or_new(rule.id, "rule");
        sqlx::query(
            r#"
            INSERT INTO pricing_rules (id, season_id, min_guests, max_guests, price_per_night, updated_at)
            VALUES (?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            ON CONFLICT (id) DO UPDATE SET
                season_id = excluded.season_id,
                min_guests = excluded.min_guests,
                max_guests = excluded.max_guests,
                price_per_night = excluded.price_per_night,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(rule.season_id)
        .bind(rule.min_guests)
        .bind(rule.max_guests)
        .bind(rule.price_per_night.to_string())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<bool, AdminError> {
        let result = sqlx::query("DELETE FROM pricing_rules WHERE id = ?")
            .bind(rule_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use sqlx::Row;

    use stayrate_core::errors::AdminError;
    use stayrate_core::pricing::admin::{PricingAdmin, PricingConfigWriter, PricingSettings};
    use stayrate_core::pricing::cache::{PricingConfigCache, SnapshotOrigin};
    use stayrate_core::pricing::source::{RuleRow, SeasonRow};

    use super::SqlPricingAdminRepository;
    use crate::repositories::SqlPricingConfigSource;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn season(id: &str, name: &str, start: i64, end: i64) -> SeasonRow {
        SeasonRow {
            id: id.to_string(),
            name: name.to_string(),
            start_month: start,
            end_month: end,
            color: None,
        }
    }

    fn rule(id: &str, season_id: &str, min: i64, max: i64, price: i64) -> RuleRow {
        RuleRow {
            id: id.to_string(),
            season_id: season_id.to_string(),
            min_guests: min,
            max_guests: max,
            price_per_night: Decimal::from(price),
        }
    }

    #[tokio::test]
    async fn upsert_setting_replaces_existing_value() {
        let pool = setup_pool().await;
        let repo = SqlPricingAdminRepository::new(pool.clone());

        repo.upsert_setting("cleaning_fee", Decimal::from(300)).await.expect("insert");
        repo.upsert_setting("cleaning_fee", Decimal::new(3505, 1)).await.expect("update");

        let rows = sqlx::query("SELECT CAST(value AS TEXT) AS value_text FROM pricing_config")
            .fetch_all(&pool)
            .await
            .expect("load settings");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<String, _>("value_text"), "350.5");

        pool.close().await;
    }

    #[tokio::test]
    async fn upsert_settings_commits_every_key_together() {
        let pool = setup_pool().await;
        let repo = SqlPricingAdminRepository::new(pool.clone());
        repo.upsert_setting("cleaning_fee", Decimal::from(300)).await.expect("seed fee");

        repo.upsert_settings(&[
            ("cleaning_fee", Decimal::from(400)),
            ("discount_percentage", Decimal::from(20)),
            ("discount_threshold_nights", Decimal::from(5)),
        ])
        .await
        .expect("save settings");

        let rows = sqlx::query(
            "SELECT key, CAST(value AS TEXT) AS value_text FROM pricing_config ORDER BY rowid",
        )
        .fetch_all(&pool)
        .await
        .expect("load settings");
        let saved: Vec<(String, String)> =
            rows.iter().map(|row| (row.get("key"), row.get("value_text"))).collect();
        assert_eq!(
            saved,
            vec![
                ("cleaning_fee".to_string(), "400".to_string()),
                ("discount_percentage".to_string(), "20".to_string()),
                ("discount_threshold_nights".to_string(), "5".to_string()),
            ]
        );

        pool.close().await;
    }

    #[tokio::test]
    async fn failed_settings_transaction_writes_nothing() {
        let pool = setup_pool().await;
        let repo = SqlPricingAdminRepository::new(pool.clone());
        sqlx::query(
            "CREATE TRIGGER reject_threshold BEFORE INSERT ON pricing_config
             WHEN NEW.key = 'discount_threshold_nights'
             BEGIN SELECT RAISE(ABORT, 'threshold locked'); END",
        )
        .execute(&pool)
        .await
        .expect("create trigger");

        let result = repo
            .upsert_settings(&[
                ("cleaning_fee", Decimal::from(400)),
                ("discount_threshold_nights", Decimal::from(5)),
            ])
            .await;

        assert!(matches!(result, Err(AdminError::Store(_))));
        let count: i64 = sqlx::query("SELECT COUNT(1) AS count FROM pricing_config")
            .fetch_one(&pool)
            .await
            .expect("count settings")
            .get("count");
        assert_eq!(count, 0);

        pool.close().await;
    }

    #[tokio::test]
    async fn empty_ids_are_generated() {
        let pool = setup_pool().await;
        let repo = SqlPricingAdminRepository::new(pool.clone());

        repo.upsert_season(season("", "Carnaval", 2, 2)).await.expect("insert season");
        let season_id: String = sqlx::query("SELECT id FROM pricing_seasons")
            .fetch_one(&pool)
            .await
            .expect("load season")
            .get("id");

        assert!(season_id.starts_with("season-"));
        pool.close().await;
    }

    #[tokio::test]
    async fn rule_updates_report_missing_rows() {
        let pool = setup_pool().await;
        let repo = SqlPricingAdminRepository::new(pool.clone());
        repo.upsert_season(season("s1", "Peak", 11, 2)).await.expect("insert season");
        repo.upsert_rule(rule("r1", "s1", 1, 6, 900)).await.expect("insert rule");

        assert!(repo.update_rule_price("r1", Decimal::from(950)).await.expect("update"));
        assert!(!repo.update_rule_price("r9", Decimal::from(950)).await.expect("update"));
        assert!(repo.delete_rule("r1").await.expect("delete"));
        assert!(!repo.delete_rule("r1").await.expect("delete again"));

        pool.close().await;
    }

    #[tokio::test]
    async fn constraint_violations_surface_as_store_errors() {
        let pool = setup_pool().await;
        let repo = SqlPricingAdminRepository::new(pool.clone());

        let result = repo.upsert_rule(rule("r1", "missing-season", 1, 6, 900)).await;

        assert!(matches!(result, Err(AdminError::Store(_))));
        pool.close().await;
    }

    #[tokio::test]
    async fn admin_writes_are_visible_to_the_next_quote() {
        let pool = setup_pool().await;
        let cache = Arc::new(PricingConfigCache::new(SqlPricingConfigSource::new(pool.clone())));
        let admin = PricingAdmin::new(SqlPricingAdminRepository::new(pool.clone()), cache.clone());

        admin.save_season(season("s1", "Any", 1, 12)).await.expect("save season");
        admin.save_rule(rule("r1", "s1", 1, 6, 900)).await.expect("save rule");
        let before = cache.snapshot().await;
        assert_eq!(before.origin(), SnapshotOrigin::Store);
        assert_eq!(before.config().seasons()[0].rate_for("1-6"), Some(Decimal::from(900)));

        admin.update_rule_price("r1", Decimal::from(990)).await.expect("update price");
        admin
            .save_settings(PricingSettings {
                cleaning_fee: Decimal::from(350),
                discount_percent: Decimal::from(20),
                discount_threshold_nights: 5,
            })
            .await
            .expect("save settings");

        let after = cache.get_config().await;
        assert_eq!(after.seasons()[0].rate_for("1-6"), Some(Decimal::from(990)));
        assert_eq!(after.cleaning_fee(), Decimal::from(350));
        assert_eq!(after.discount_percentage(), Decimal::new(20, 2));
        assert_eq!(after.discount_threshold_nights(), 5);

        pool.close().await;
    }
}
