use std::fmt;

use serde::Serialize;

use crate::domain::pricing_config::PricingConfig;
use crate::domain::season::{GuestBracket, MonthSet};

/// Problems that change nothing about how prices resolve but likely point at
/// a configuration mistake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    /// Both seasons own `months`; the earlier one always wins them.
    SeasonOverlap { first: String, second: String, months: Vec<u32> },
    BracketOverlap { season: String, first: GuestBracket, second: GuestBracket },
    /// Months owned by no season resolve through the fallback season.
    UncoveredMonths { months: Vec<u32> },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeasonOverlap { first, second, months } => write!(
                f,
                "seasons `{first}` and `{second}` both own months {months:?}; `{first}` wins"
            ),
            Self::BracketOverlap { season, first, second } => {
                write!(f, "season `{season}` has overlapping brackets {first} and {second}")
            }
            Self::UncoveredMonths { months } => {
                write!(f, "months {months:?} belong to no season and use the fallback season")
            }
        }
    }
}

pub fn validate_config(config: &PricingConfig) -> Vec<ConfigWarning> {
    let seasons = config.seasons();
    let mut warnings = Vec::new();

    for (index, first) in seasons.iter().enumerate() {
        for second in &seasons[index + 1..] {
            let shared = first.months.intersection(second.months);
            if !shared.is_empty() {
                warnings.push(ConfigWarning::SeasonOverlap {
                    first: first.name.clone(),
                    second: second.name.clone(),
                    months: shared.months().collect(),
                });
            }
        }
    }

    for season in seasons {
        let rates = season.rates();
        for (index, first) in rates.iter().enumerate() {
            for second in &rates[index + 1..] {
                if first.bracket.overlaps(second.bracket) {
                    warnings.push(ConfigWarning::BracketOverlap {
                        season: season.name.clone(),
                        first: first.bracket,
                        second: second.bracket,
                    });
                }
            }
        }
    }

    let covered = seasons.iter().fold(MonthSet::EMPTY, |acc, season| acc.union(season.months));
    let uncovered = covered.complement();
    if !uncovered.is_empty() {
        warnings.push(ConfigWarning::UncoveredMonths { months: uncovered.months().collect() });
    }

    warnings
}
