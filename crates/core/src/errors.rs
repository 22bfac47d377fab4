use chrono::NaiveDate;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("month `{0}` is outside 1..=12")]
    InvalidMonth(u32),
    #[error("invalid guest bracket `{0}` (expected `min-max` with 1 <= min <= max)")]
    InvalidGuestBracket(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Calculation-level failures. These reach the caller as validation errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("check-out {check_out} must be after check-in {check_in}")]
    InvalidDateRange { check_in: NaiveDate, check_out: NaiveDate },
    #[error("stay of {nights} nights exceeds the maximum of {max}")]
    StayTooLong { nights: i64, max: u32 },
    #[error("guest bracket `{bracket}` has no nightly rate for {date}")]
    UnmappedGuestBracket { bracket: String, date: NaiveDate },
    #[error("pricing configuration has no seasons")]
    NoSeasonsConfigured,
}

/// Raised at the store adapter boundary. The cache layer recovers from it by
/// serving the built-in default configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigUnavailable {
    #[error("pricing store unreachable: {0}")]
    Store(String),
    #[error("pricing store returned malformed rows: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("rejected pricing edit: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("pricing store write failed: {0}")]
    Store(String),
}
