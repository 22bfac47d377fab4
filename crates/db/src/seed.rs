use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use tracing::info;

use stayrate_core::domain::season::MonthSet;
use stayrate_core::pricing::defaults::fallback_config;
use stayrate_core::pricing::source::{
    CLEANING_FEE_KEY, DISCOUNT_PERCENTAGE_KEY, DISCOUNT_THRESHOLD_NIGHTS_KEY,
};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Writes the built-in default configuration into an empty store, so a fresh
/// install prices exactly as the offline fallback does.
pub struct DefaultPricingSeed;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    /// `false` when the store already held seasons and nothing was written.
    pub applied: bool,
    pub settings_written: usize,
    pub seasons_written: usize,
    pub rules_written: usize,
}

impl DefaultPricingSeed {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        let existing: i64 = sqlx::query("SELECT COUNT(1) AS count FROM pricing_seasons")
            .fetch_one(&mut *tx)
            .await?
            .try_get("count")?;
        if existing > 0 {
            tx.rollback().await?;
            info!(event_name = "pricing.seed.skipped", existing, "pricing store already seeded");
            return Ok(SeedResult {
                applied: false,
                settings_written: 0,
                seasons_written: 0,
                rules_written: 0,
            });
        }

        let config = fallback_config();
        let settings = [
            (CLEANING_FEE_KEY, config.cleaning_fee()),
            (
                DISCOUNT_PERCENTAGE_KEY,
                (config.discount_percentage() * Decimal::ONE_HUNDRED).normalize(),
            ),
            (DISCOUNT_THRESHOLD_NIGHTS_KEY, Decimal::from(config.discount_threshold_nights())),
        ];
        for (key, value) in &settings {
            sqlx::query(
                "INSERT INTO pricing_config (key, value, description) VALUES (?, ?, ?)
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(*key)
            .bind(value.to_string())
            .bind(format!("pricing setting {key}"))
            .execute(&mut *tx)
            .await?;
        }

        let mut rules_written = 0;
        for season in config.seasons() {
            let (start_month, end_month) = month_bounds(season.months);
            sqlx::query(
                "INSERT INTO pricing_seasons (id, name, start_month, end_month) VALUES (?, ?, ?, ?)",
            )
            .bind(&season.id.0)
            .bind(&season.name)
            .bind(i64::from(start_month))
            .bind(i64::from(end_month))
            .execute(&mut *tx)
            .await?;

            for rate in season.rates() {
                sqlx::query(
                    "INSERT INTO pricing_rules (id, season_id, min_guests, max_guests, price_per_night)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(format!("{}-{}", season.id.0, rate.bracket.key()))
                .bind(&season.id.0)
                .bind(i64::from(rate.bracket.min_guests()))
                .bind(i64::from(rate.bracket.max_guests()))
                .bind(rate.nightly_rate.to_string())
                .execute(&mut *tx)
                .await?;
                rules_written += 1;
            }
        }

        tx.commit().await?;

        let result = SeedResult {
            applied: true,
            settings_written: settings.len(),
            seasons_written: config.seasons().len(),
            rules_written,
        };
        info!(
            event_name = "pricing.seed.applied",
            seasons = result.seasons_written,
            rules = result.rules_written,
            "default pricing seeded"
        );
        Ok(result)
    }

    /// Removes every pricing row. Test databases only.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM pricing_rules").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM pricing_seasons").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM pricing_config").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Start and end of the longest contiguous run, wrapping December into
/// January. Legacy season names ignore these columns, but they must still
/// hold valid months.
fn month_bounds(months: MonthSet) -> (u32, u32) {
    let mut best = (1, 12, 0);
    for start in months.months() {
        if months.len() < 12 && months.contains(previous_month(start)) {
            continue;
        }
        let mut end = start;
        let mut length = 1;
        while length < 12 && months.contains(end % 12 + 1) {
            end = end % 12 + 1;
            length += 1;
        }
        if length > best.2 {
            best = (start, end, length);
        }
    }
    (best.0, best.1)
}

fn previous_month(month: u32) -> u32 {
    if month == 1 {
        12
    } else {
        month - 1
    }
}
