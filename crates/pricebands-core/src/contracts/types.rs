use serde::Serialize;

use crate::pipeline::RowAccounting;

#[derive(Debug, Clone, Serialize)]
pub struct RunData {
    pub run_id: String,
    pub dry_run: bool,
    pub message: String,
    pub inputs: RunInputs,
    pub accounting: RowAccounting,
    pub batch_correction: BatchCorrectionSummary,
    pub valuation: ValuationSummary,
    pub lookups: LookupSummary,
    pub band_labels: Vec<String>,
    pub region_count: usize,
    pub postcode_count: usize,
    pub top_regions: TopRegionsPreview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<WrittenOutputs>,
    pub warnings: Vec<RunWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunInputs {
    pub transactions: String,
    pub geography: String,
    pub price_index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchCorrectionSummary {
    pub strategy: String,
    pub affected_groups: u64,
    pub affected_rows: u64,
    pub value_removed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationSummary {
    pub historical_matches: u64,
    pub uprated: u64,
    pub latest_quarter: Option<String>,
    pub sale_range: DataRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookupSummary {
    pub geography_records: u64,
    pub geography_duplicates_ignored: u64,
    pub geography_without_region: u64,
    pub index_points: u64,
    pub index_duplicates_ignored: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopRegionsPreview {
    pub returned: usize,
    pub truncated: bool,
    pub rows: Vec<RegionPreviewRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionPreviewRow {
    pub region_code: String,
    pub band_counts: Vec<u64>,
    pub total_sales: u64,
    pub rejected_duplicates: u64,
    pub undated: u64,
    pub liability_estimate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenOutputs {
    pub region_table: String,
    pub postcode_table: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunWarning {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub brackets: Vec<BandContract>,
    pub batch_correction: bool,
    pub exclude_other_property_type: bool,
    pub price_index_header_row: usize,
    pub region_file: String,
    pub postcode_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BandContract {
    pub label: String,
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate: f64,
}
