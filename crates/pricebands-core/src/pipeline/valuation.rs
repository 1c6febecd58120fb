use chrono::NaiveDate;

use crate::pipeline::brackets::BracketTable;
use crate::pipeline::date::quarter_end;
use crate::pipeline::price_index::PriceIndexTable;
use crate::pipeline::types::{EnrichedTransaction, RegionRecord, Transaction};

/// `latest / historical` when both are known and historical is positive,
/// otherwise exactly `1.0` so the sale is left at its recorded price.
pub fn inflation_factor(historical: Option<f64>, latest: Option<f64>) -> f64 {
    let (Some(historical), Some(latest)) = (historical, latest) else {
        return 1.0;
    };
    if !(historical > 0.0) || !latest.is_finite() {
        return 1.0;
    }
    let factor = latest / historical;
    if factor.is_finite() { factor } else { 1.0 }
}

/// Joins sales to the regional price index and uprates them to the index's
/// latest quarter.
#[derive(Debug, Clone, Copy)]
pub struct ValuationNormalizer<'a> {
    index: &'a PriceIndexTable,
    brackets: &'a BracketTable,
}

impl<'a> ValuationNormalizer<'a> {
    pub fn new(index: &'a PriceIndexTable, brackets: &'a BracketTable) -> Self {
        Self { index, brackets }
    }

    pub fn enrich(
        &self,
        transaction: Transaction,
        sale_date: NaiveDate,
        region: &RegionRecord,
    ) -> EnrichedTransaction {
        let historical_median_price = self
            .index
            .median_at(&region.region_code, quarter_end(sale_date));
        let latest_median_price = self.index.latest_median(&region.region_code);
        let inflation_factor = inflation_factor(historical_median_price, latest_median_price);
        let uprated_price = transaction.price.scale(inflation_factor);
        let value_bracket = self.brackets.classify(uprated_price);

        EnrichedTransaction {
            transaction,
            sale_date,
            normalized_postcode: region.normalized_postcode.clone(),
            region_code: region.region_code.clone(),
            historical_median_price,
            latest_median_price,
            inflation_factor,
            uprated_price,
            value_bracket,
        }
    }
}
