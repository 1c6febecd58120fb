use std::path::Path;

use crate::pipeline::date::parse_quarter_label;
use crate::pipeline::types::PriceIndexPoint;
use crate::source::{PRICE_INDEX_SOURCE, field, header_names, index_by_name, open_source};
use crate::{PipelineError, PipelineResult};

const AREA_CODE_HEADER: &str = "Area Code";
const QUARTER_HEADER_MARKER: &str = "Year ending";

/// Reads a wide regional median-price sheet and unpivots it into
/// (region, quarter-end, median) points. `header_row` preamble lines above the
/// header are skipped.
pub fn load_price_index(path: &Path, header_row: usize) -> PipelineResult<Vec<PriceIndexPoint>> {
    let mut file = open_source(PRICE_INDEX_SOURCE, path)?;
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut file, &mut bytes).map_err(|error| {
        PipelineError::source_unreadable(PRICE_INDEX_SOURCE, path, &error.to_string())
    })?;
    let points = parse_price_index(&bytes, header_row)?;
    tracing::info!(path = %path.display(), points = points.len(), "loaded price index");
    Ok(points)
}

pub fn parse_price_index(bytes: &[u8], header_row: usize) -> PipelineResult<Vec<PriceIndexPoint>> {
    let body = skip_lines(bytes, header_row);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let header_line = header_row as u64 + 1;
    let headers = reader
        .byte_headers()
        .map(header_names)
        .map_err(|error| {
            PipelineError::source_malformed(PRICE_INDEX_SOURCE, header_line, "header", &error.to_string())
        })?;
    let columns = index_by_name(&headers);
    let Some(area_column) = columns.get(AREA_CODE_HEADER).copied() else {
        return Err(PipelineError::source_schema_mismatch(
            PRICE_INDEX_SOURCE,
            vec![AREA_CODE_HEADER.to_string()],
            headers,
        ));
    };

    let mut quarter_columns = Vec::new();
    for (position, name) in headers.iter().enumerate() {
        if !name.contains(QUARTER_HEADER_MARKER) {
            continue;
        }
        match parse_quarter_label(name) {
            Some(quarter_end_date) => quarter_columns.push((position, quarter_end_date)),
            None => tracing::debug!(header = %name, "skipping unparseable quarter column"),
        }
    }
    if quarter_columns.is_empty() {
        return Err(PipelineError::source_schema_mismatch(
            PRICE_INDEX_SOURCE,
            vec![
                AREA_CODE_HEADER.to_string(),
                format!("{QUARTER_HEADER_MARKER} <Mon> <YYYY>"),
            ],
            headers,
        ));
    }

    let mut points = Vec::new();
    let mut skipped_cells = 0usize;
    for (index, result) in reader.byte_records().enumerate() {
        let record = result.map_err(|error| {
            PipelineError::source_malformed(
                PRICE_INDEX_SOURCE,
                header_line + index as u64 + 1,
                "record",
                &error.to_string(),
            )
        })?;
        let region_code = field(&record, area_column);
        if region_code.is_empty() {
            continue;
        }
        for (position, quarter_end_date) in &quarter_columns {
            match parse_median(&field(&record, *position)) {
                Some(median_price) => points.push(PriceIndexPoint {
                    region_code: region_code.clone(),
                    quarter_end_date: *quarter_end_date,
                    median_price,
                }),
                None => skipped_cells += 1,
            }
        }
    }

    tracing::debug!(
        quarter_columns = quarter_columns.len(),
        skipped_cells,
        "price index unpivoted"
    );
    Ok(points)
}

/// `:`, `[x]` and blanks mark suppressed medians and yield `None`.
fn parse_median(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace([',', '£'], "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn skip_lines(bytes: &[u8], count: usize) -> &[u8] {
    let mut rest = bytes;
    for _ in 0..count {
        match rest.iter().position(|byte| *byte == b'\n') {
            Some(newline) => rest = &rest[newline + 1..],
            None => return &[],
        }
    }
    rest
}
