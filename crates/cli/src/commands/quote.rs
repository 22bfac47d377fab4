use chrono::NaiveDate;
use clap::Args;
use serde_json::json;

use crate::commands::{build_runtime, load_config, pricing_cache, CommandResult};
use stayrate_core::domain::breakdown::StayRequest;
use stayrate_core::pricing::QuoteService;

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Arrival date (YYYY-MM-DD)")]
    pub check_in: NaiveDate,
    #[arg(long, help = "Departure date (YYYY-MM-DD); that night is not charged")]
    pub check_out: NaiveDate,
    #[command(flatten)]
    pub party: PartyArgs,
}

#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct PartyArgs {
    #[arg(long, help = "Guest bracket key such as `1-6`")]
    pub bracket: Option<String>,
    #[arg(long, help = "Head count, mapped to the first bracket that contains it")]
    pub guests: Option<u32>,
}

enum Party {
    Bracket(String),
    Guests(u32),
}

impl PartyArgs {
    fn into_party(self) -> Option<Party> {
        match (self.bracket, self.guests) {
            (Some(bracket), _) => Some(Party::Bracket(bracket)),
            (None, Some(guests)) => Some(Party::Guests(guests)),
            (None, None) => None,
        }
    }
}

pub fn run(args: QuoteArgs) -> CommandResult {
    let QuoteArgs { check_in, check_out, party } = args;
    let Some(party) = party.into_party() else {
        return CommandResult::failure("quote", "argument", "pass --bracket or --guests", 2);
    };

    let config = match load_config("quote") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let runtime = match build_runtime("quote") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let (cache, pool) = pricing_cache(&config).await;
        let origin = cache.snapshot().await.origin();
        let quotes = QuoteService::new(cache, config.pricing.calculator());

        let priced = match party {
            Party::Bracket(guest_bracket) => {
                quotes
                    .quote(&StayRequest { check_in, check_out, guest_bracket })
                    .await
            }
            Party::Guests(guests) => quotes.quote_for_guests(check_in, check_out, guests).await,
        };

        if let Some(pool) = pool {
            pool.close().await;
        }

        priced
            .map(|breakdown| (origin, breakdown))
            .map_err(|error| ("pricing_validation", error.to_string(), 6u8))
    });

    match result {
        Ok((origin, breakdown)) => CommandResult::success_with_data(
            "quote",
            format!(
                "{} nights in {}, total {}",
                breakdown.num_nights, breakdown.season_name, breakdown.total
            ),
            Some(json!({ "origin": origin, "breakdown": breakdown })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("quote", error_class, message, exit_code)
        }
    }
}
