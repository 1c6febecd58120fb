use chrono::NaiveDate;
use pricebands_core::pipeline::brackets::{BracketTable, ValueBracket};
use pricebands_core::pipeline::dedupe::dedupe_latest_sales;
use pricebands_core::pipeline::money::Money;
use pricebands_core::pipeline::types::{PriceIndexPoint, PropertyType, RegionRecord, Transaction};
use pricebands_core::{PipelineInputs, PipelineSettings, run_pipeline};

const POSTCODES: [&str; 6] = ["AB1 2CD", "ab12cd", "XY9 9XY", "CD3 4EF", "EF5 6GH", "ZZ9 9ZZ"];
const TYPES: [&str; 5] = ["D", "S", "T", "F", "O"];

/// Linear congruential generator so the battery is reproducible without extra
/// dependencies.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn pick(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

fn synthetic_ledger(seed: u64, rows: usize) -> Vec<Transaction> {
    let mut rng = Lcg(seed);
    (0..rows)
        .map(|_| {
            let sale_date = if rng.pick(20) == 0 {
                None
            } else {
                NaiveDate::from_ymd_opt(2015 + rng.pick(10) as i32, 1 + rng.pick(12) as u32, 1)
            };
            let price_steps = [900_000, 2_000_000, 2_400_000, 3_000_000, 4_999_999, 7_000_000];
            Transaction {
                price: Money::from_pounds(price_steps[rng.pick(price_steps.len())]),
                sale_date,
                raw_postcode: POSTCODES[rng.pick(POSTCODES.len())].to_string(),
                property_type: PropertyType::from_code(TYPES[rng.pick(TYPES.len())]),
                primary_address_component: (1 + rng.pick(4)).to_string(),
                secondary_address_component: if rng.pick(3) == 0 {
                    "FLAT 1".to_string()
                } else {
                    String::new()
                },
            }
        })
        .collect()
}

fn geography() -> Vec<RegionRecord> {
    [("AB1 2CD", "R1"), ("XY9 9XY", "R1"), ("CD3 4EF", "R2"), ("EF5 6GH", "")]
        .into_iter()
        .map(|(postcode, region)| RegionRecord {
            region_code: region.to_string(),
            normalized_postcode: postcode.to_string(),
            postcode_label: postcode.to_string(),
            coordinates: None,
        })
        .collect()
}

fn price_index() -> Vec<PriceIndexPoint> {
    let mut points = Vec::new();
    for year in 2015..2025 {
        for (month, day) in [(3, 31), (6, 30), (9, 30), (12, 31)] {
            let Some(quarter_end_date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            points.push(PriceIndexPoint {
                region_code: "R1".to_string(),
                quarter_end_date,
                median_price: 150_000.0 + f64::from(year - 2015) * 10_000.0,
            });
        }
    }
    points
}

fn inputs(seed: u64) -> PipelineInputs {
    PipelineInputs {
        transactions: synthetic_ledger(seed, 400),
        geography: geography(),
        price_index: price_index(),
    }
}

#[test]
fn global_outcomes_partition_every_row() {
    for seed in [1, 7, 42, 1_000] {
        let output = run_pipeline(inputs(seed), &PipelineSettings::standard());
        let accounting = output.diagnostics.accounting;
        assert_eq!(accounting.total_read, 400);
        assert!(accounting.is_balanced(), "seed {seed}: {accounting:?}");
    }
}

#[test]
fn per_unit_counts_sum_to_global_counts() {
    for seed in [3, 11, 99] {
        let output = run_pipeline(inputs(seed), &PipelineSettings::standard());
        let accounting = output.diagnostics.accounting;
        for rows in [
            output
                .tables
                .regions
                .iter()
                .map(|region| region.row.clone())
                .collect::<Vec<_>>(),
            output
                .tables
                .postcodes
                .iter()
                .map(|postcode| postcode.row.clone())
                .collect::<Vec<_>>(),
        ] {
            let kept = rows.iter().map(|row| row.total_sales).sum::<u64>();
            let rejected = rows.iter().map(|row| row.rejected_duplicates).sum::<u64>();
            let undated = rows.iter().map(|row| row.date_unparseable).sum::<u64>();
            assert_eq!(kept, accounting.unique_kept);
            assert_eq!(rejected, accounting.rejected_duplicate);
            assert_eq!(undated, accounting.date_unparseable);
            for row in &rows {
                assert_eq!(row.band_counts.iter().sum::<u64>(), row.total_sales);
            }
        }
    }
}

#[test]
fn region_rows_are_ordered_by_top_band() {
    let output = run_pipeline(inputs(5), &PipelineSettings::standard());
    let top_counts = output
        .tables
        .regions
        .iter()
        .map(|region| region.row.band_count(ValueBracket::TOP))
        .collect::<Vec<u64>>();
    assert!(top_counts.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn unresolved_lookup_entries_never_form_units() {
    let output = run_pipeline(inputs(8), &PipelineSettings::standard());
    assert!(
        output
            .tables
            .postcodes
            .iter()
            .all(|row| row.row.unit_code != "EF56GH" && row.row.unit_code != "ZZ99ZZ")
    );
    assert_eq!(output.diagnostics.geography_without_region, 1);
}

#[test]
fn dedup_is_idempotent_on_synthetic_ledgers() {
    for seed in [2, 13, 77] {
        let first = dedupe_latest_sales(synthetic_ledger(seed, 300));
        let second = dedupe_latest_sales(first.unique.clone());
        assert_eq!(second.unique, first.unique);
        assert!(second.discarded.is_empty());
    }
}

#[test]
fn unmatched_index_quarters_leave_prices_unscaled() {
    let mut inputs = inputs(21);
    inputs.price_index.clear();
    let output = run_pipeline(inputs, &PipelineSettings::standard());
    assert_eq!(output.diagnostics.uprated, 0);
    assert_eq!(output.diagnostics.latest_quarter, None);
}

#[test]
fn bracket_boundaries_are_half_open() {
    let brackets = BracketTable::default();
    assert_eq!(brackets.classify(Money::from_pounds(2_000_000)).index(), 1);
    assert_eq!(brackets.classify(Money::from_pence(199_999_999)).index(), 0);
    assert_eq!(brackets.classify(Money::from_pounds(5_000_000)), ValueBracket::TOP);
}
