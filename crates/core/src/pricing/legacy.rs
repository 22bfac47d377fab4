//! Fixed month sets for season names that predate the `start_month` /
//! `end_month` columns. Rows carrying one of these names ignore their stored
//! range. Delete an entry once its rows store the correct range.

use crate::domain::season::MonthSet;

pub const HIGH_SEASON: &str = "Alta Temporada";
pub const MID_SEASON: &str = "Média Temporada";
pub const LOW_SEASON: &str = "Baixa Temporada";

const LEGACY_SEASON_MONTHS: &[(&str, &[u32])] = &[
    (HIGH_SEASON, &[12, 1, 2, 7]),
    (MID_SEASON, &[3, 4, 5, 6, 8, 9, 10]),
    (LOW_SEASON, &[11]),
];

/// Exact, case-sensitive name match.
pub fn legacy_months(season_name: &str) -> Option<MonthSet> {
    LEGACY_SEASON_MONTHS
        .iter()
        .find(|(name, _)| *name == season_name)
        .and_then(|(_, months)| MonthSet::from_months(months.iter().copied()).ok())
}
