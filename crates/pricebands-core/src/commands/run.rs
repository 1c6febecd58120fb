use std::path::{Path, PathBuf};

use ulid::Ulid;

use crate::config::RunConfig;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    BatchCorrectionSummary, DataRange, LookupSummary, RegionPreviewRow, RunData, RunInputs,
    RunWarning, TopRegionsPreview, ValuationSummary, WrittenOutputs,
};
use crate::output::write_tables;
use crate::pipeline::date::format_iso_date;
use crate::pipeline::{PipelineInputs, PipelineOutput, run_pipeline};
use crate::source::{SourcePaths, load_geography, load_price_index, load_transactions};
use crate::{PipelineError, PipelineResult};

const TOP_REGIONS_PREVIEW_LIMIT: usize = 10;

#[derive(Debug, Default)]
pub struct RunOptions<'a> {
    pub transactions: Option<PathBuf>,
    pub geography: Option<PathBuf>,
    pub price_index: Option<PathBuf>,
    pub config_path: Option<&'a Path>,
    pub out_dir: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn run(
    transactions: Option<PathBuf>,
    geography: Option<PathBuf>,
    price_index: Option<PathBuf>,
    dry_run: bool,
) -> PipelineResult<SuccessEnvelope> {
    run_with_options(RunOptions {
        transactions,
        geography,
        price_index,
        config_path: None,
        out_dir: None,
        dry_run,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: RunOptions<'_>) -> PipelineResult<SuccessEnvelope> {
    let config = RunConfig::load(options.config_path)?;
    let settings = config.validate()?;

    let transactions_path = require_path(options.transactions, "--transactions")?;
    let geography_path = require_path(options.geography, "--geography")?;
    let price_index_path = require_path(options.price_index, "--price-index")?;
    SourcePaths {
        transactions: &transactions_path,
        geography: &geography_path,
        price_index: &price_index_path,
    }
    .ensure_present()?;

    let run_id = format!("run_{}", Ulid::new());
    tracing::info!(run_id = %run_id, dry_run = options.dry_run, "run started");

    let inputs = PipelineInputs {
        price_index: load_price_index(&price_index_path, config.price_index.header_row)?,
        geography: load_geography(&geography_path)?,
        transactions: load_transactions(&transactions_path)?,
    };
    let output = run_pipeline(inputs, &settings);

    let outputs = if options.dry_run {
        None
    } else {
        let out_dir = options.out_dir.unwrap_or_else(|| PathBuf::from("."));
        let written = write_tables(
            &out_dir,
            &config.output.region_file,
            &config.output.postcode_file,
            &output.tables.regions,
            &output.tables.postcodes,
            &settings.brackets,
        )?;
        Some(WrittenOutputs {
            region_table: written.region_path.display().to_string(),
            postcode_table: written.postcode_path.display().to_string(),
        })
    };

    let data = RunData {
        run_id,
        dry_run: options.dry_run,
        message: run_message(&output, options.dry_run),
        inputs: RunInputs {
            transactions: transactions_path.display().to_string(),
            geography: geography_path.display().to_string(),
            price_index: price_index_path.display().to_string(),
            config: options.config_path.map(|path| path.display().to_string()),
        },
        accounting: output.diagnostics.accounting,
        batch_correction: batch_summary(&output),
        valuation: valuation_summary(&output),
        lookups: lookup_summary(&output),
        band_labels: settings.brackets.labels().to_vec(),
        region_count: output.tables.regions.len(),
        postcode_count: output.tables.postcodes.len(),
        top_regions: top_regions_preview(&output),
        outputs,
        warnings: run_warnings(&output),
    };

    success("run", data)
}

fn require_path(value: Option<PathBuf>, flag: &str) -> PipelineResult<PathBuf> {
    value.ok_or_else(|| {
        PipelineError::invalid_argument_for_command(
            &format!("Missing required input `{flag}`."),
            Some("run"),
        )
    })
}

fn run_message(output: &PipelineOutput, dry_run: bool) -> String {
    let accounting = &output.diagnostics.accounting;
    let verb = if dry_run { "Dry run kept" } else { "Kept" };
    format!(
        "{verb} {} of {} transactions across {} regions.",
        accounting.unique_kept,
        accounting.total_read,
        output.tables.regions.len()
    )
}

fn batch_summary(output: &PipelineOutput) -> BatchCorrectionSummary {
    let diagnostics = &output.diagnostics;
    BatchCorrectionSummary {
        strategy: diagnostics.batch_strategy.to_string(),
        affected_groups: diagnostics.batch_affected_groups,
        affected_rows: diagnostics.batch_affected_rows,
        value_removed: diagnostics.batch_value_removed.as_pounds_f64(),
    }
}

fn valuation_summary(output: &PipelineOutput) -> ValuationSummary {
    let diagnostics = &output.diagnostics;
    ValuationSummary {
        historical_matches: diagnostics.historical_matches,
        uprated: diagnostics.uprated,
        latest_quarter: diagnostics.latest_quarter.as_ref().map(format_iso_date),
        sale_range: DataRange {
            earliest: diagnostics.earliest_sale.as_ref().map(format_iso_date),
            latest: diagnostics.latest_sale.as_ref().map(format_iso_date),
        },
    }
}

fn lookup_summary(output: &PipelineOutput) -> LookupSummary {
    let diagnostics = &output.diagnostics;
    LookupSummary {
        geography_records: diagnostics.geography_records,
        geography_duplicates_ignored: diagnostics.geography_duplicates_ignored,
        geography_without_region: diagnostics.geography_without_region,
        index_points: diagnostics.index_points,
        index_duplicates_ignored: diagnostics.index_duplicates_ignored,
    }
}

fn top_regions_preview(output: &PipelineOutput) -> TopRegionsPreview {
    let rows = output
        .tables
        .regions
        .iter()
        .take(TOP_REGIONS_PREVIEW_LIMIT)
        .map(|region| RegionPreviewRow {
            region_code: region.row.unit_code.clone(),
            band_counts: region.row.band_counts.to_vec(),
            total_sales: region.row.total_sales,
            rejected_duplicates: region.row.rejected_duplicates,
            undated: region.row.date_unparseable,
            liability_estimate: region.liability_estimate.as_pounds_f64(),
        })
        .collect::<Vec<RegionPreviewRow>>();
    TopRegionsPreview {
        returned: rows.len(),
        truncated: output.tables.regions.len() > rows.len(),
        rows,
    }
}

fn run_warnings(output: &PipelineOutput) -> Vec<RunWarning> {
    let diagnostics = &output.diagnostics;
    let accounting = &diagnostics.accounting;
    let mut warnings = Vec::new();

    if accounting.total_read > 0 && accounting.unique_kept == 0 {
        warnings.push(RunWarning {
            code: "no_transactions_kept".to_string(),
            message: "No transaction survived filtering; check that the geography lookup covers the ledger's postcodes.".to_string(),
        });
    }
    if accounting.unique_kept > 0 && diagnostics.historical_matches == 0 {
        warnings.push(RunWarning {
            code: "no_index_matches".to_string(),
            message: "No sale matched a price-index quarter, so nothing was uprated. Check `price_index.header_row` and the index's region codes.".to_string(),
        });
    }
    if diagnostics.latest_quarter.is_none() {
        warnings.push(RunWarning {
            code: "empty_price_index".to_string(),
            message: "The price index produced no usable points.".to_string(),
        });
    }
    if !accounting.is_balanced() {
        warnings.push(RunWarning {
            code: "accounting_imbalance".to_string(),
            message: format!(
                "Classified {} rows but read {}.",
                accounting.classified(),
                accounting.total_read
            ),
        });
    }
    warnings
}
