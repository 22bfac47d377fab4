use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::season::SeasonId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_bracket: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightCharge {
    pub date: NaiveDate,
    pub season_id: SeasonId,
    pub season_name: String,
    pub nightly_rate: Decimal,
    /// False when the bracket had no rate in this night's season.
    pub bracket_mapped: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSubtotal {
    pub season_name: String,
    pub nights: u32,
    pub subtotal: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

/// Result of pricing one stay. Monetary fields are whole currency units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub price_per_night: Decimal,
    pub num_nights: u32,
    pub subtotal: Decimal,
    pub cleaning_fee: Decimal,
    pub discount_applied: bool,
    pub discount_amount: Decimal,
    pub total: Decimal,
    /// Season contributing the largest share of the subtotal.
    pub season_name: String,
    /// Ordered by each season's first night in the stay.
    pub season_totals: Vec<SeasonSubtotal>,
    pub nights: Vec<NightCharge>,
    pub unmapped_nights: u32,
    pub trace: Vec<PricingTraceStep>,
}
