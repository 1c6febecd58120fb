use chrono::NaiveDate;
use serde::Serialize;

use crate::pipeline::brackets::ValueBracket;
use crate::pipeline::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Detached,
    SemiDetached,
    Terraced,
    Flat,
    Other,
}

impl PropertyType {
    /// Maps Price Paid type codes; blank or unknown codes fall into `Other`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "D" => Self::Detached,
            "S" => Self::SemiDetached,
            "T" => Self::Terraced,
            "F" => Self::Flat,
            _ => Self::Other,
        }
    }
}

/// One recorded sale as read from the ledger. `sale_date` is `None` when the
/// source date could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub price: Money,
    pub sale_date: Option<NaiveDate>,
    pub raw_postcode: String,
    pub property_type: PropertyType,
    pub primary_address_component: String,
    pub secondary_address_component: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub region_code: String,
    pub normalized_postcode: String,
    /// Postcode as printed in the lookup (e.g. `SW1A 1AA`).
    pub postcode_label: String,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceIndexPoint {
    pub region_code: String,
    pub quarter_end_date: NaiveDate,
    pub median_price: f64,
}

/// A deduplicated, geography-resolved, uprated transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    pub sale_date: NaiveDate,
    pub normalized_postcode: String,
    pub region_code: String,
    pub historical_median_price: Option<f64>,
    pub latest_median_price: Option<f64>,
    pub inflation_factor: f64,
    pub uprated_price: Money,
    pub value_bracket: ValueBracket,
}
