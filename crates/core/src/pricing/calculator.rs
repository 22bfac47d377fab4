use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::breakdown::{
    NightCharge, PriceBreakdown, PricingTraceStep, SeasonSubtotal, StayRequest,
};
use crate::domain::pricing_config::PricingConfig;
use crate::errors::PricingError;
use crate::pricing::resolver::resolve_season;

pub const DEFAULT_MAX_STAY_NIGHTS: u32 = 60;

/// What to charge for a night whose season has no rate for the requested
/// guest bracket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedBracketPolicy {
    /// Charge zero for the night and log a warning.
    #[default]
    ZeroRate,
    /// Fail the calculation with `PricingError::UnmappedGuestBracket`.
    Reject,
}

impl std::str::FromStr for UnmappedBracketPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zero_rate" => Ok(Self::ZeroRate),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unsupported unmapped bracket policy `{other}` (expected zero_rate|reject)"
            )),
        }
    }
}

pub trait StayPricer: Send + Sync {
    fn price_stay(
        &self,
        config: &PricingConfig,
        request: &StayRequest,
    ) -> Result<PriceBreakdown, PricingError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceCalculator {
    max_stay_nights: u32,
    unmapped_bracket: UnmappedBracketPolicy,
}

impl Default for PriceCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STAY_NIGHTS, UnmappedBracketPolicy::default())
    }
}

impl StayPricer for PriceCalculator {
    fn price_stay(
        &self,
        config: &PricingConfig,
        request: &StayRequest,
    ) -> Result<PriceBreakdown, PricingError> {
        self.calculate(config, request.check_in, request.check_out, &request.guest_bracket)
    }
}

impl PriceCalculator {
    pub fn new(max_stay_nights: u32, unmapped_bracket: UnmappedBracketPolicy) -> Self {
        Self { max_stay_nights, unmapped_bracket }
    }

    pub fn max_stay_nights(&self) -> u32 {
        self.max_stay_nights
    }

    pub fn unmapped_bracket(&self) -> UnmappedBracketPolicy {
        self.unmapped_bracket
    }

    /// Prices each night `[check_in, check_out)` by its own season. Amounts
    /// are only rounded when reported, never per night.
    pub fn calculate(
        &self,
        config: &PricingConfig,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guest_bracket: &str,
    ) -> Result<PriceBreakdown, PricingError> {
        let num_nights = self.count_nights(check_in, check_out)?;

        let mut subtotal = Decimal::ZERO;
        let mut season_totals: Vec<SeasonSubtotal> = Vec::new();
        let mut nights = Vec::with_capacity(num_nights as usize);
        let mut unmapped_nights = 0u32;

        for date in check_in.iter_days().take(num_nights as usize) {
            let season = resolve_season(date, config).ok_or(PricingError::NoSeasonsConfigured)?;
            let (nightly_rate, bracket_mapped) =
                match (season.rate_for(guest_bracket), self.unmapped_bracket) {
                    (Some(rate), _) => (rate, true),
                    (None, UnmappedBracketPolicy::ZeroRate) => {
                        unmapped_nights += 1;
                        (Decimal::ZERO, false)
                    }
                    (None, UnmappedBracketPolicy::Reject) => {
                        return Err(PricingError::UnmappedGuestBracket {
                            bracket: guest_bracket.to_string(),
                            date,
                        });
                    }
                };

            subtotal += nightly_rate;
            add_to_season(&mut season_totals, &season.name, nightly_rate);
            nights.push(NightCharge {
                date,
                season_id: season.id.clone(),
                season_name: season.name.clone(),
                nightly_rate,
                bracket_mapped,
            });
        }

        if unmapped_nights > 0 {
            warn!(
                event_name = "pricing.calculator.unmapped_bracket",
                guest_bracket,
                unmapped_nights,
                num_nights,
                "guest bracket has no rate for some nights; charged zero"
            );
        }

        let price_per_night = round_currency(subtotal / Decimal::from(num_nights));
        let discount_applied = num_nights >= config.discount_threshold_nights();
        let discount_amount = if discount_applied {
            round_currency(subtotal * config.discount_percentage())
        } else {
            Decimal::ZERO
        };
        let total = round_currency(subtotal - discount_amount + config.cleaning_fee());
        let season_name = dominant_season(&season_totals);

        let trace = build_trace(
            config,
            guest_bracket,
            num_nights,
            round_currency(subtotal),
            discount_applied,
            discount_amount,
            total,
        );

        Ok(PriceBreakdown {
            price_per_night,
            num_nights,
            subtotal: round_currency(subtotal),
            cleaning_fee: round_currency(config.cleaning_fee()),
            discount_applied,
            discount_amount,
            total,
            season_name,
            season_totals,
            nights,
            unmapped_nights,
            trace,
        })
    }

    fn count_nights(&self, check_in: NaiveDate, check_out: NaiveDate) -> Result<u32, PricingError> {
        let days = (check_out - check_in).num_days();
        if days <= 0 {
            return Err(PricingError::InvalidDateRange { check_in, check_out });
        }

        let too_long = PricingError::StayTooLong { nights: days, max: self.max_stay_nights };
        let nights = u32::try_from(days).map_err(|_| too_long.clone())?;
        if nights > self.max_stay_nights {
            return Err(too_long);
        }
        Ok(nights)
    }
}

/// Nearest whole currency unit, halves rounded up.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn add_to_season(totals: &mut Vec<SeasonSubtotal>, season_name: &str, amount: Decimal) {
    match totals.iter_mut().find(|entry| entry.season_name == season_name) {
        Some(entry) => {
            entry.nights += 1;
            entry.subtotal += amount;
        }
        None => totals.push(SeasonSubtotal {
            season_name: season_name.to_string(),
            nights: 1,
            subtotal: amount,
        }),
    }
}

/// Largest subtotal wins; on a tie the season seen later in the stay wins.
fn dominant_season(totals: &[SeasonSubtotal]) -> String {
    totals
        .iter()
        .fold(None::<&SeasonSubtotal>, |best, entry| match best {
            Some(current) if current.subtotal > entry.subtotal => Some(current),
            _ => Some(entry),
        })
        .map(|entry| entry.season_name.clone())
        .unwrap_or_default()
}

fn build_trace(
    config: &PricingConfig,
    guest_bracket: &str,
    num_nights: u32,
    subtotal: Decimal,
    discount_applied: bool,
    discount_amount: Decimal,
    total: Decimal,
) -> Vec<PricingTraceStep> {
    let threshold = config.discount_threshold_nights();
    let percent = (config.discount_percentage() * Decimal::ONE_HUNDRED).normalize();
    let discount_detail = if discount_applied {
        format!("{percent}% off for stays of at least {threshold} nights")
    } else {
        format!("{num_nights} nights is below the {threshold}-night threshold")
    };

    vec![
        PricingTraceStep {
            stage: "subtotal".to_string(),
            detail: format!("sum of {num_nights} nightly rates for bracket {guest_bracket}"),
            amount: subtotal,
        },
        PricingTraceStep {
            stage: "discount".to_string(),
            detail: discount_detail,
            amount: -discount_amount,
        },
        PricingTraceStep {
            stage: "cleaning_fee".to_string(),
            detail: "flat fee per booking".to_string(),
            amount: round_currency(config.cleaning_fee()),
        },
        PricingTraceStep {
            stage: "total".to_string(),
            detail: "subtotal - discount + cleaning fee".to_string(),
            amount: total,
        },
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};
    use rust_decimal::Decimal;

    use super::{round_currency, PriceCalculator, StayPricer, UnmappedBracketPolicy};
    use crate::domain::breakdown::StayRequest;
    use crate::domain::pricing_config::PricingConfig;
    use crate::domain::season::{GuestBracket, MonthSet, Season, SeasonId};
    use crate::errors::PricingError;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn bracket(min: u32, max: u32) -> GuestBracket {
        GuestBracket::new(min, max).expect("valid bracket")
    }

    fn all_year_config() -> PricingConfig {
        let season = Season::new(SeasonId("all".into()), "All Year", MonthSet::ALL)
            .with_rate(bracket(1, 6), Decimal::from(900));
        PricingConfig::new(Decimal::from(300), 7, Decimal::new(15, 2), vec![season])
            .expect("valid config")
    }

    fn two_season_config() -> PricingConfig {
        let summer = Season::new(
            SeasonId("summer".into()),
            "Summer",
            MonthSet::span(11, 2).expect("span"),
        )
        .with_rate(bracket(1, 6), Decimal::from(1200))
        .with_rate(bracket(7, 8), Decimal::from(1500));
        let rest = Season::new(SeasonId("rest".into()), "Rest", MonthSet::span(3, 10).expect("span"))
            .with_rate(bracket(1, 6), Decimal::from(800));
        PricingConfig::new(Decimal::from(250), 5, Decimal::new(10, 2), vec![summer, rest])
            .expect("valid config")
    }

    #[test]
    fn seven_night_stay_applies_long_stay_discount() {
        let breakdown = PriceCalculator::default()
            .calculate(&all_year_config(), date(2026, 5, 1), date(2026, 5, 8), "1-6")
            .expect("priced");

        assert_eq!(breakdown.num_nights, 7);
        assert_eq!(breakdown.subtotal, Decimal::from(6300));
        assert!(breakdown.discount_applied);
        assert_eq!(breakdown.discount_amount, Decimal::from(945));
        assert_eq!(breakdown.cleaning_fee, Decimal::from(300));
        assert_eq!(breakdown.total, Decimal::from(5655));
        assert_eq!(breakdown.price_per_night, Decimal::from(900));
        assert_eq!(breakdown.season_name, "All Year");
    }

    #[test]
    fn six_night_stay_pays_full_rate() {
        let breakdown = PriceCalculator::default()
            .calculate(&all_year_config(), date(2026, 5, 1), date(2026, 5, 7), "1-6")
            .expect("priced");

        assert_eq!(breakdown.num_nights, 6);
        assert!(!breakdown.discount_applied);
        assert_eq!(breakdown.discount_amount, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::from(5700));
    }

    #[test]
    fn discount_threshold_is_inclusive() {
        let config = two_season_config();
        let calculator = PriceCalculator::default();
        let check_in = date(2026, 4, 1);

        let at_threshold = calculator
            .calculate(&config, check_in, date(2026, 4, 6), "1-6")
            .expect("priced");
        let below = calculator
            .calculate(&config, check_in, date(2026, 4, 5), "1-6")
            .expect("priced");

        assert_eq!(at_threshold.num_nights, 5);
        assert!(at_threshold.discount_applied);
        assert_eq!(below.num_nights, 4);
        assert!(!below.discount_applied);
    }

    #[test]
    fn stay_across_seasons_and_year_boundary_prices_each_night() {
        let breakdown = PriceCalculator::default()
            .calculate(&two_season_config(), date(2027, 2, 26), date(2027, 3, 3), "1-6")
            .expect("priced");

        assert_eq!(breakdown.num_nights, 5);
        let rates: Vec<Decimal> = breakdown.nights.iter().map(|night| night.nightly_rate).collect();
        assert_eq!(
            rates,
            vec![
                Decimal::from(1200),
                Decimal::from(1200),
                Decimal::from(1200),
                Decimal::from(800),
                Decimal::from(800),
            ]
        );
        assert_eq!(breakdown.subtotal, Decimal::from(5200));
        assert_eq!(breakdown.season_name, "Summer");
        assert_eq!(breakdown.season_totals.len(), 2);
        assert_eq!(breakdown.season_totals[0].season_name, "Summer");
        assert_eq!(breakdown.season_totals[0].nights, 3);
        assert_eq!(breakdown.season_totals[1].subtotal, Decimal::from(1600));
    }

    #[test]
    fn new_year_stay_stays_in_wraparound_season() {
        let breakdown = PriceCalculator::default()
            .calculate(&two_season_config(), date(2026, 12, 30), date(2027, 1, 2), "7-8")
            .expect("priced");

        assert_eq!(breakdown.num_nights, 3);
        assert_eq!(breakdown.subtotal, Decimal::from(4500));
        assert!(breakdown.nights.iter().all(|night| night.season_name == "Summer"));
    }

    #[test]
    fn season_totals_sum_to_subtotal_for_every_stay_length() {
        let config = two_season_config();
        let calculator = PriceCalculator::default();
        let check_in = date(2026, 10, 20);

        for length in 1..=60u64 {
            let check_out = check_in.checked_add_days(Days::new(length)).expect("date");
            let breakdown =
                calculator.calculate(&config, check_in, check_out, "1-6").expect("priced");

            assert_eq!(u64::from(breakdown.num_nights), length);
            assert_eq!(breakdown.nights.len() as u64, length);
            let season_sum: Decimal =
                breakdown.season_totals.iter().map(|entry| entry.subtotal).sum();
            assert_eq!(season_sum, breakdown.subtotal);
            let season_nights: u32 = breakdown.season_totals.iter().map(|entry| entry.nights).sum();
            assert_eq!(season_nights, breakdown.num_nights);
            assert!(breakdown.total >= breakdown.cleaning_fee);
            assert_eq!(
                breakdown.total,
                breakdown.subtotal - breakdown.discount_amount + breakdown.cleaning_fee
            );
        }
    }

    #[test]
    fn identical_inputs_yield_identical_breakdowns() {
        let config = two_season_config();
        let request = StayRequest {
            check_in: date(2026, 10, 28),
            check_out: date(2026, 11, 6),
            guest_bracket: "1-6".to_string(),
        };
        let calculator = PriceCalculator::default();

        let first = calculator.price_stay(&config, &request).expect("priced");
        let second = calculator.price_stay(&config, &request).expect("priced");

        assert_eq!(first, second);
    }

    #[test]
    fn unmapped_bracket_charges_only_the_cleaning_fee() {
        let breakdown = PriceCalculator::default()
            .calculate(&all_year_config(), date(2026, 5, 1), date(2026, 5, 4), "11-20")
            .expect("priced");

        assert_eq!(breakdown.subtotal, Decimal::ZERO);
        assert_eq!(breakdown.unmapped_nights, 3);
        assert!(breakdown.nights.iter().all(|night| !night.bracket_mapped));
        assert_eq!(breakdown.total, Decimal::from(300));
        assert_eq!(breakdown.season_name, "All Year");
    }

    #[test]
    fn partially_unmapped_bracket_charges_zero_for_missing_nights() {
        // "7-8" only exists in summer.
        let breakdown = PriceCalculator::default()
            .calculate(&two_season_config(), date(2027, 2, 27), date(2027, 3, 2), "7-8")
            .expect("priced");

        assert_eq!(breakdown.unmapped_nights, 1);
        assert_eq!(breakdown.subtotal, Decimal::from(3000));
    }

    #[test]
    fn reject_policy_fails_on_first_unmapped_night() {
        let calculator = PriceCalculator::new(60, UnmappedBracketPolicy::Reject);
        let result = calculator.calculate(
            &two_season_config(),
            date(2027, 2, 27),
            date(2027, 3, 2),
            "7-8",
        );

        assert_eq!(
            result,
            Err(PricingError::UnmappedGuestBracket {
                bracket: "7-8".to_string(),
                date: date(2027, 3, 1),
            })
        );
    }

    #[test]
    fn check_out_must_follow_check_in() {
        let calculator = PriceCalculator::default();
        let config = all_year_config();

        let same_day = calculator.calculate(&config, date(2026, 5, 1), date(2026, 5, 1), "1-6");
        let reversed = calculator.calculate(&config, date(2026, 5, 2), date(2026, 5, 1), "1-6");

        assert!(matches!(same_day, Err(PricingError::InvalidDateRange { .. })));
        assert!(matches!(reversed, Err(PricingError::InvalidDateRange { .. })));
    }

    #[test]
    fn stays_beyond_the_cap_are_rejected_before_pricing() {
        let calculator = PriceCalculator::new(60, UnmappedBracketPolicy::ZeroRate);
        let config = all_year_config();
        let check_in = date(2026, 1, 1);

        let at_cap = calculator.calculate(
            &config,
            check_in,
            check_in.checked_add_days(Days::new(60)).expect("date"),
            "1-6",
        );
        let over_cap = calculator.calculate(
            &config,
            check_in,
            check_in.checked_add_days(Days::new(61)).expect("date"),
            "1-6",
        );

        assert!(at_cap.is_ok());
        assert_eq!(over_cap, Err(PricingError::StayTooLong { nights: 61, max: 60 }));
    }

    #[test]
    fn average_nightly_price_rounds_half_up() {
        let season = Season::new(SeasonId("odd".into()), "Odd", MonthSet::span(1, 1).expect("span"))
            .with_rate(bracket(1, 6), Decimal::new(5005, 1));
        let other = Season::new(SeasonId("even".into()), "Even", MonthSet::span(2, 12).expect("span"))
            .with_rate(bracket(1, 6), Decimal::from(500));
        let config =
            PricingConfig::new(Decimal::from(100), 30, Decimal::ZERO, vec![season, other])
                .expect("valid config");

        // 500.5 + 500 = 1000.5 over two nights.
        let breakdown = PriceCalculator::default()
            .calculate(&config, date(2026, 1, 31), date(2026, 2, 2), "1-6")
            .expect("priced");

        assert_eq!(breakdown.price_per_night, Decimal::from(500));
        assert_eq!(breakdown.subtotal, Decimal::from(1001));
        assert_eq!(breakdown.total, Decimal::from(1101));
        assert_eq!(breakdown.season_name, "Odd");
    }

    #[test]
    fn dominant_season_tie_goes_to_later_season() {
        let config = two_season_config();
        // Two summer nights at 1200, three March nights at 800.
        let breakdown = PriceCalculator::default()
            .calculate(&config, date(2027, 2, 27), date(2027, 3, 4), "1-6")
            .expect("priced");
        assert_eq!(breakdown.season_totals[0].subtotal, Decimal::from(2400));
        assert_eq!(breakdown.season_totals[1].subtotal, Decimal::from(2400));
        assert_eq!(breakdown.season_name, "Rest");
    }

    #[test]
    fn trace_records_each_pricing_stage() {
        let breakdown = PriceCalculator::default()
            .calculate(&all_year_config(), date(2026, 5, 1), date(2026, 5, 8), "1-6")
            .expect("priced");

        let stages: Vec<&str> = breakdown.trace.iter().map(|step| step.stage.as_str()).collect();
        assert_eq!(stages, vec!["subtotal", "discount", "cleaning_fee", "total"]);
        assert_eq!(breakdown.trace[1].amount, Decimal::from(-945));
        assert!(breakdown.trace[1].detail.contains("15%"));
    }

    #[test]
    fn round_currency_rounds_midpoints_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(9445, 1)), Decimal::from(945));
        assert_eq!(round_currency(Decimal::new(9444, 1)), Decimal::from(944));
    }

    #[test]
    fn unmapped_policy_parses_from_config_strings() {
        assert_eq!("zero_rate".parse(), Ok(UnmappedBracketPolicy::ZeroRate));
        assert_eq!(" Reject ".parse(), Ok(UnmappedBracketPolicy::Reject));
        assert!("ignore".parse::<UnmappedBracketPolicy>().is_err());
    }
}
