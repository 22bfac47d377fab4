use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::pricing_config::PricingConfig;
use crate::domain::season::{GuestBracket, MonthSet, SeasonId};

const MONTH_ABBREVIATIONS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RateCardPrice {
    pub bracket: String,
    pub nightly_rate: Decimal,
}

/// One column of the public price table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RateCardEntry {
    pub season_id: SeasonId,
    pub season_name: String,
    pub period: String,
    /// The second season is highlighted on the public page.
    pub featured: bool,
    pub prices: Vec<RateCardPrice>,
}

/// Rates for `brackets` in every season, in configuration order. Brackets a
/// season does not price show as zero.
pub fn rate_card(config: &PricingConfig, brackets: &[GuestBracket]) -> Vec<RateCardEntry> {
    config
        .seasons()
        .iter()
        .enumerate()
        .map(|(index, season)| RateCardEntry {
            season_id: season.id.clone(),
            season_name: season.name.clone(),
            period: period_label(season.months),
            featured: index == 1,
            prices: brackets
                .iter()
                .map(|bracket| RateCardPrice {
                    bracket: bracket.key(),
                    nightly_rate: season.rate_for_bracket(*bracket).unwrap_or(Decimal::ZERO),
                })
                .collect(),
        })
        .collect()
}

/// Human label for a month set: `"Nov-Feb"` for a wrapping run, `"Nov"` for
/// a single month, runs joined by commas otherwise.
pub fn period_label(months: MonthSet) -> String {
    if months == MonthSet::ALL {
        return "All year".to_string();
    }

    let mut runs = Vec::new();
    for start in months.months() {
        if months.contains(previous_month(start)) {
            continue;
        }
        let mut end = start;
        while months.contains(next_month(end)) {
            end = next_month(end);
        }
        runs.push(if start == end {
            month_name(start).to_string()
        } else {
            format!("{}-{}", month_name(start), month_name(end))
        });
    }
    runs.join(", ")
}

fn previous_month(month: u32) -> u32 {
    if month == 1 {
        12
    } else {
        month - 1
    }
}

fn next_month(month: u32) -> u32 {
    month % 12 + 1
}

fn month_name(month: u32) -> &'static str {
    (month as usize)
        .checked_sub(1)
        .and_then(|index| MONTH_ABBREVIATIONS.get(index))
        .copied()
        .unwrap_or("")
}
