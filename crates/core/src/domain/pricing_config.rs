use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::season::{GuestBracket, Season};
use crate::errors::DomainError;

/// Immutable pricing snapshot. Each cache refresh builds a new one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PricingConfig {
    cleaning_fee: Decimal,
    discount_threshold_nights: u32,
    discount_percentage: Decimal,
    seasons: Vec<Season>,
}

impl PricingConfig {
    /// `discount_percentage` is a fraction in `[0, 1]`, not a whole percent.
    pub fn new(
        cleaning_fee: Decimal,
        discount_threshold_nights: u32,
        discount_percentage: Decimal,
        seasons: Vec<Season>,
    ) -> Result<Self, DomainError> {
        if cleaning_fee.is_sign_negative() {
            return Err(DomainError::InvariantViolation(format!(
                "cleaning fee must not be negative (got {cleaning_fee})"
            )));
        }
        if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE {
            return Err(DomainError::InvariantViolation(format!(
                "discount percentage must be within [0, 1] (got {discount_percentage})"
            )));
        }
        if seasons.is_empty() {
            return Err(DomainError::InvariantViolation(
                "pricing configuration needs at least one season".to_string(),
            ));
        }
        if let Some(rate) = seasons
            .iter()
            .flat_map(|season| season.rates())
            .find(|rate| rate.nightly_rate.is_sign_negative())
        {
            return Err(DomainError::InvariantViolation(format!(
                "nightly rate for bracket {} must not be negative",
                rate.bracket
            )));
        }

        Ok(Self { cleaning_fee, discount_threshold_nights, discount_percentage, seasons })
    }

    /// Skips validation. Only for built-in constant data.
    pub(crate) fn from_trusted_parts(
        cleaning_fee: Decimal,
        discount_threshold_nights: u32,
        discount_percentage: Decimal,
        seasons: Vec<Season>,
    ) -> Self {
        Self { cleaning_fee, discount_threshold_nights, discount_percentage, seasons }
    }

    pub fn cleaning_fee(&self) -> Decimal {
        self.cleaning_fee
    }

    pub fn discount_threshold_nights(&self) -> u32 {
        self.discount_threshold_nights
    }

    pub fn discount_percentage(&self) -> Decimal {
        self.discount_percentage
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// First configured bracket containing `guests`, scanning seasons in
    /// order and each season's brackets in insertion order.
    pub fn bracket_for_guests(&self, guests: u32) -> Option<GuestBracket> {
        self.seasons
            .iter()
            .flat_map(|season| season.rates())
            .map(|rate| rate.bracket)
            .find(|bracket| bracket.contains(guests))
    }

    /// Distinct brackets across all seasons, sorted by lower bound.
    pub fn brackets(&self) -> Vec<GuestBracket> {
        let mut brackets: Vec<GuestBracket> =
            self.seasons.iter().flat_map(|season| season.rates()).map(|rate| rate.bracket).collect();
        brackets.sort();
        brackets.dedup();
        brackets
    }
}
