pub mod admin;
pub mod cache;
pub mod calculator;
pub mod defaults;
pub mod legacy;
pub mod normalize;
pub mod rate_card;
pub mod resolver;
pub mod source;
pub mod validation;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::breakdown::{PriceBreakdown, StayRequest};
use crate::errors::PricingError;

use self::{
    cache::PricingConfigCache,
    calculator::{PriceCalculator, StayPricer},
    rate_card::{rate_card, RateCardEntry},
    source::PricingConfigSource,
};

/// Booking-widget entry point: prices stays against the cached snapshot.
pub struct QuoteService<S, P = PriceCalculator> {
    cache: Arc<PricingConfigCache<S>>,
    pricer: P,
}

impl<S, P> QuoteService<S, P>
where
    S: PricingConfigSource,
    P: StayPricer,
{
    pub fn new(cache: Arc<PricingConfigCache<S>>, pricer: P) -> Self {
        Self { cache, pricer }
    }

    pub fn cache(&self) -> &Arc<PricingConfigCache<S>> {
        &self.cache
    }

    pub async fn quote(&self, request: &StayRequest) -> Result<PriceBreakdown, PricingError> {
        let config = self.cache.get_config().await;
        self.pricer.price_stay(&config, request)
    }

    /// Prices by head count. A count outside every configured bracket is
    /// priced as an unmapped bracket.
    pub async fn quote_for_guests(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> Result<PriceBreakdown, PricingError> {
        let config = self.cache.get_config().await;
        let guest_bracket = config
            .bracket_for_guests(guests)
            .map(|bracket| bracket.key())
            .unwrap_or_else(|| format!("{guests}-{guests}"));

        self.pricer.price_stay(&config, &StayRequest { check_in, check_out, guest_bracket })
    }

    pub async fn rate_card(&self) -> Vec<RateCardEntry> {
        let config = self.cache.get_config().await;
        rate_card(&config, &config.brackets())
    }
}
