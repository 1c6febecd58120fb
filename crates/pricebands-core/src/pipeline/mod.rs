//! The batch transform from raw sales to per-unit value-band tables.
//!
//! Stage order is fixed: property-type filter, batch-sale correction, identity
//! dedup, geography join, valuation, bracket aggregation. Each stage returns
//! its own counts; nothing accumulates in shared state.

pub mod aggregate;
pub mod batch;
pub mod brackets;
pub mod date;
pub mod dedupe;
pub mod geography;
pub mod money;
pub mod normalize;
pub mod price_index;
pub mod types;
pub mod valuation;

use chrono::NaiveDate;
use serde::Serialize;

use aggregate::{AggregationTables, UnitDiscard, aggregate};
use batch::{BatchCorrection, NoCorrection, PortfolioSplit, correct_batch_sales};
use brackets::{BracketTable, RateTable};
use dedupe::{DiscardReason, dedupe_latest_sales};
use geography::GeographyResolver;
use money::Money;
use normalize::normalize_postcode;
use price_index::PriceIndexTable;
use types::{PriceIndexPoint, PropertyType, RegionRecord, Transaction};
use valuation::ValuationNormalizer;

/// Validated knobs the pipeline runs with.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub brackets: BracketTable,
    pub rates: RateTable,
    pub batch_correction: bool,
    pub exclude_other_property_type: bool,
}

impl PipelineSettings {
    pub fn standard() -> Self {
        Self {
            batch_correction: true,
            exclude_other_property_type: true,
            ..Self::default()
        }
    }
}

/// The three fully loaded input tables.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub transactions: Vec<Transaction>,
    pub geography: Vec<RegionRecord>,
    pub price_index: Vec<PriceIndexPoint>,
}

/// Where every input row ended up. The five outcomes are disjoint and
/// assigned in field order, so `total_read` is always their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowAccounting {
    pub total_read: u64,
    pub other_property_excluded: u64,
    pub geography_unresolved: u64,
    pub date_unparseable: u64,
    pub rejected_duplicate: u64,
    pub unique_kept: u64,
}

impl RowAccounting {
    pub fn classified(&self) -> u64 {
        self.other_property_excluded
            + self.geography_unresolved
            + self.date_unparseable
            + self.rejected_duplicate
            + self.unique_kept
    }

    pub fn is_balanced(&self) -> bool {
        self.classified() == self.total_read
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunDiagnostics {
    pub accounting: RowAccounting,
    pub batch_strategy: &'static str,
    pub batch_affected_groups: u64,
    pub batch_affected_rows: u64,
    pub batch_value_removed: Money,
    pub historical_matches: u64,
    pub uprated: u64,
    pub latest_quarter: Option<NaiveDate>,
    pub earliest_sale: Option<NaiveDate>,
    pub latest_sale: Option<NaiveDate>,
    pub geography_records: u64,
    pub geography_duplicates_ignored: u64,
    pub geography_without_region: u64,
    pub index_points: u64,
    pub index_duplicates_ignored: u64,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub tables: AggregationTables,
    pub diagnostics: RunDiagnostics,
}

pub fn run_pipeline(inputs: PipelineInputs, settings: &PipelineSettings) -> PipelineOutput {
    let PipelineInputs {
        mut transactions,
        geography,
        price_index,
    } = inputs;

    let geography = GeographyResolver::from_records(geography);
    let index = PriceIndexTable::from_points(price_index);
    tracing::info!(
        transactions = transactions.len(),
        postcodes = geography.len(),
        index_points = index.len(),
        "pipeline inputs resident"
    );

    let mut accounting = RowAccounting {
        total_read: transactions.len() as u64,
        ..RowAccounting::default()
    };

    if settings.exclude_other_property_type {
        let before = transactions.len();
        transactions.retain(|transaction| transaction.property_type != PropertyType::Other);
        accounting.other_property_excluded = (before - transactions.len()) as u64;
        tracing::info!(
            excluded = accounting.other_property_excluded,
            "property-type filter finished"
        );
    }

    let BatchCorrection {
        transactions,
        strategy,
        affected_groups,
        affected_rows,
        value_removed,
    } = if settings.batch_correction {
        correct_batch_sales(transactions, &PortfolioSplit)
    } else {
        correct_batch_sales(transactions, &NoCorrection)
    };

    let deduped = dedupe_latest_sales(transactions);

    let mut unit_discards = Vec::with_capacity(deduped.discarded.len());
    for discarded in &deduped.discarded {
        let Some(region) = geography.resolve(&discarded.normalized_postcode) else {
            accounting.geography_unresolved += 1;
            continue;
        };
        match discarded.reason {
            DiscardReason::DateUnparseable => accounting.date_unparseable += 1,
            DiscardReason::OlderDuplicate => accounting.rejected_duplicate += 1,
        }
        unit_discards.push(UnitDiscard {
            region,
            reason: discarded.reason,
        });
    }

    let normalizer = ValuationNormalizer::new(&index, &settings.brackets);
    let mut kept = Vec::with_capacity(deduped.unique.len());
    for transaction in deduped.unique {
        let normalized_postcode = normalize_postcode(&transaction.raw_postcode);
        let Some(region) = geography.resolve(&normalized_postcode) else {
            accounting.geography_unresolved += 1;
            tracing::debug!(postcode = %transaction.raw_postcode, "no geography match");
            continue;
        };
        let Some(sale_date) = transaction.sale_date else {
            accounting.date_unparseable += 1;
            unit_discards.push(UnitDiscard {
                region,
                reason: DiscardReason::DateUnparseable,
            });
            continue;
        };
        kept.push((normalizer.enrich(transaction, sale_date, region), region));
    }
    accounting.unique_kept = kept.len() as u64;

    let historical_matches = kept
        .iter()
        .filter(|(enriched, _)| enriched.historical_median_price.is_some())
        .count() as u64;
    let uprated = kept
        .iter()
        .filter(|(enriched, _)| enriched.inflation_factor != 1.0)
        .count() as u64;
    let earliest_sale = kept.iter().map(|(enriched, _)| enriched.sale_date).min();
    let latest_sale = kept.iter().map(|(enriched, _)| enriched.sale_date).max();
    tracing::info!(
        kept = kept.len(),
        historical_matches,
        uprated,
        "valuation finished"
    );

    let tables = aggregate(
        kept.iter().map(|(enriched, region)| (enriched, *region)),
        &unit_discards,
        &settings.rates,
    );

    if !accounting.is_balanced() {
        tracing::warn!(
            total_read = accounting.total_read,
            classified = accounting.classified(),
            "row accounting does not balance"
        );
    }

    let diagnostics = RunDiagnostics {
        accounting,
        batch_strategy: strategy,
        batch_affected_groups: affected_groups as u64,
        batch_affected_rows: affected_rows as u64,
        batch_value_removed: value_removed,
        historical_matches,
        uprated,
        latest_quarter: index.latest_quarter(),
        earliest_sale,
        latest_sale,
        geography_records: geography.len() as u64,
        geography_duplicates_ignored: geography.duplicates_ignored() as u64,
        geography_without_region: geography.discarded_without_region() as u64,
        index_points: index.len() as u64,
        index_duplicates_ignored: index.duplicates_ignored() as u64,
    };

    PipelineOutput {
        tables,
        diagnostics,
    }
}
