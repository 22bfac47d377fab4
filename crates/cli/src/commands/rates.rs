use serde_json::json;

use crate::commands::{build_runtime, load_config, pricing_cache, CommandResult};
use stayrate_core::pricing::rate_card::rate_card;

pub fn run() -> CommandResult {
    let config = match load_config("rates") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("rates") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let (origin, card, settings) = runtime.block_on(async {
        let (cache, pool) = pricing_cache(&config).await;
        let snapshot = cache.snapshot().await;
        if let Some(pool) = pool {
            pool.close().await;
        }

        let pricing = snapshot.config();
        let settings = json!({
            "cleaning_fee": pricing.cleaning_fee(),
            "discount_percentage": pricing.discount_percentage(),
            "discount_threshold_nights": pricing.discount_threshold_nights(),
        });
        (snapshot.origin(), rate_card(pricing, &pricing.brackets()), settings)
    });

    CommandResult::success_with_data(
        "rates",
        format!("{} seasons", card.len()),
        Some(json!({ "origin": origin, "settings": settings, "seasons": card })),
    )
}
