use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonId(pub String);

/// Calendar months owned by a season, one bit per month.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", try_from = "Vec<u32>")]
pub struct MonthSet(u16);

impl MonthSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0x0FFF);

    /// Closed month range. When `start > end` the range wraps the year
    /// boundary, so `span(11, 2)` owns Nov, Dec, Jan and Feb.
    pub fn span(start: u32, end: u32) -> Result<Self, DomainError> {
        check_month(start)?;
        check_month(end)?;

        let set = if start <= end {
            (start..=end).fold(Self::EMPTY, Self::with)
        } else {
            (start..=12).chain(1..=end).fold(Self::EMPTY, Self::with)
        };
        Ok(set)
    }

    pub fn from_months<I>(months: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = u32>,
    {
        months.into_iter().try_fold(Self::EMPTY, |set, month| {
            check_month(month)?;
            Ok(set.with(month))
        })
    }

    pub fn contains(self, month: u32) -> bool {
        (1..=12).contains(&month) && self.0 & bit(month) != 0
    }

    pub fn months(self) -> impl Iterator<Item = u32> {
        (1..=12).filter(move |month| self.contains(*month))
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn complement(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    fn with(self, month: u32) -> Self {
        Self(self.0 | bit(month))
    }
}

fn bit(month: u32) -> u16 {
    1u16 << (month - 1)
}

fn check_month(month: u32) -> Result<(), DomainError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(DomainError::InvalidMonth(month))
    }
}

impl fmt::Debug for MonthSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.months()).finish()
    }
}

impl From<MonthSet> for Vec<u32> {
    fn from(value: MonthSet) -> Self {
        value.months().collect()
    }
}

impl TryFrom<Vec<u32>> for MonthSet {
    type Error = DomainError;

    fn try_from(value: Vec<u32>) -> Result<Self, Self::Error> {
        Self::from_months(value)
    }
}

/// Closed interval of guest counts, keyed canonically as `"min-max"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuestBracket {
    min_guests: u32,
    max_guests: u32,
}

impl GuestBracket {
    pub fn new(min_guests: u32, max_guests: u32) -> Result<Self, DomainError> {
        if min_guests == 0 || min_guests > max_guests {
            return Err(DomainError::InvalidGuestBracket(format!("{min_guests}-{max_guests}")));
        }
        Ok(Self { min_guests, max_guests })
    }

    pub fn min_guests(self) -> u32 {
        self.min_guests
    }

    pub fn max_guests(self) -> u32 {
        self.max_guests
    }

    pub fn contains(self, guests: u32) -> bool {
        (self.min_guests..=self.max_guests).contains(&guests)
    }

    pub fn overlaps(self, other: Self) -> bool {
        self.min_guests <= other.max_guests && other.min_guests <= self.max_guests
    }

    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GuestBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min_guests, self.max_guests)
    }
}

impl FromStr for GuestBracket {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidGuestBracket(value.to_string());
        let (min, max) = value.trim().split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse::<u32>().map_err(|_| invalid())?;
        let max = max.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(min, max).map_err(|_| invalid())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRate {
    pub bracket: GuestBracket,
    pub nightly_rate: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub months: MonthSet,
    rates: Vec<BracketRate>,
}

impl Season {
    pub fn new(id: SeasonId, name: impl Into<String>, months: MonthSet) -> Self {
        Self { id, name: name.into(), months, rates: Vec::new() }
    }

    pub fn with_rate(mut self, bracket: GuestBracket, nightly_rate: Decimal) -> Self {
        self.set_rate(bracket, nightly_rate);
        self
    }

    /// Later writes for the same bracket replace the earlier rate in place.
    pub fn set_rate(&mut self, bracket: GuestBracket, nightly_rate: Decimal) {
        match self.rates.iter_mut().find(|rate| rate.bracket == bracket) {
            Some(existing) => existing.nightly_rate = nightly_rate,
            None => self.rates.push(BracketRate { bracket, nightly_rate }),
        }
    }

    pub fn rates(&self) -> &[BracketRate] {
        &self.rates
    }

    /// Nightly rate for a canonical bracket key. Keys that do not parse as a
    /// bracket never match.
    pub fn rate_for(&self, bracket_key: &str) -> Option<Decimal> {
        let wanted = bracket_key.parse::<GuestBracket>().ok()?;
        self.rate_for_bracket(wanted)
    }

    pub fn rate_for_bracket(&self, bracket: GuestBracket) -> Option<Decimal> {
        self.rates.iter().find(|rate| rate.bracket == bracket).map(|rate| rate.nightly_rate)
    }

    pub fn owns_month(&self, month: u32) -> bool {
        self.months.contains(month)
    }
}
