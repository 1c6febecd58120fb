use std::collections::BTreeMap;

use serde::Serialize;

use crate::pipeline::brackets::{BAND_COUNT, RateTable, ValueBracket};
use crate::pipeline::dedupe::DiscardReason;
use crate::pipeline::money::Money;
use crate::pipeline::types::{Coordinates, EnrichedTransaction, RegionRecord};

/// Band counts and rejection tallies for one geographic unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationRow {
    pub unit_code: String,
    pub band_counts: [u64; BAND_COUNT],
    pub total_sales: u64,
    pub rejected_duplicates: u64,
    pub date_unparseable: u64,
}

impl AggregationRow {
    fn new(unit_code: &str) -> Self {
        Self {
            unit_code: unit_code.to_string(),
            ..Self::default()
        }
    }

    pub fn band_count(&self, bracket: ValueBracket) -> u64 {
        self.band_counts[bracket.index()]
    }

    /// Every row this unit received, kept or not.
    pub fn total_seen(&self) -> u64 {
        self.total_sales + self.rejected_duplicates + self.date_unparseable
    }

    fn record_kept(&mut self, bracket: ValueBracket) {
        self.band_counts[bracket.index()] += 1;
        self.total_sales += 1;
    }

    fn record_discarded(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::OlderDuplicate => self.rejected_duplicates += 1,
            DiscardReason::DateUnparseable => self.date_unparseable += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRow {
    #[serde(flatten)]
    pub row: AggregationRow,
    pub liability_estimate: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostcodeRow {
    #[serde(flatten)]
    pub row: AggregationRow,
    pub postcode_label: String,
    #[serde(skip)]
    pub coordinates: Option<Coordinates>,
}

/// A geography-resolved row that did not make the unique set.
#[derive(Debug, Clone, Copy)]
pub struct UnitDiscard<'a> {
    pub region: &'a RegionRecord,
    pub reason: DiscardReason,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationTables {
    /// Top band descending; ties in ascending region code.
    pub regions: Vec<RegionRow>,
    /// Ascending normalized postcode.
    pub postcodes: Vec<PostcodeRow>,
}

/// Builds both unit tables in one pass over the kept and discarded rows.
///
/// `kept` is paired with the lookup record it resolved to so that postcode rows
/// can carry the display label and coordinates.
pub fn aggregate<'a>(
    kept: impl IntoIterator<Item = (&'a EnrichedTransaction, &'a RegionRecord)>,
    discarded: &[UnitDiscard<'a>],
    rates: &RateTable,
) -> AggregationTables {
    let mut regions: BTreeMap<&str, AggregationRow> = BTreeMap::new();
    let mut postcodes: BTreeMap<&str, (AggregationRow, &RegionRecord)> = BTreeMap::new();

    for (enriched, region) in kept {
        regions
            .entry(enriched.region_code.as_str())
            .or_insert_with(|| AggregationRow::new(&enriched.region_code))
            .record_kept(enriched.value_bracket);
        postcodes
            .entry(region.normalized_postcode.as_str())
            .or_insert_with(|| (AggregationRow::new(&region.normalized_postcode), region))
            .0
            .record_kept(enriched.value_bracket);
    }

    for discard in discarded {
        let region = discard.region;
        regions
            .entry(region.region_code.as_str())
            .or_insert_with(|| AggregationRow::new(&region.region_code))
            .record_discarded(discard.reason);
        postcodes
            .entry(region.normalized_postcode.as_str())
            .or_insert_with(|| (AggregationRow::new(&region.normalized_postcode), region))
            .0
            .record_discarded(discard.reason);
    }

    let mut region_rows = regions
        .into_values()
        .map(|row| RegionRow {
            liability_estimate: rates.liability(&row.band_counts),
            row,
        })
        .collect::<Vec<RegionRow>>();
    // Stable: equal top-band counts keep ascending region order.
    region_rows.sort_by(|left, right| {
        right
            .row
            .band_count(ValueBracket::TOP)
            .cmp(&left.row.band_count(ValueBracket::TOP))
    });

    let postcode_rows = postcodes
        .into_values()
        .map(|(row, region)| PostcodeRow {
            row,
            postcode_label: region.postcode_label.clone(),
            coordinates: region.coordinates,
        })
        .collect::<Vec<PostcodeRow>>();

    tracing::info!(
        regions = region_rows.len(),
        postcodes = postcode_rows.len(),
        "bracket aggregation finished"
    );

    AggregationTables {
        regions: region_rows,
        postcodes: postcode_rows,
    }
}
