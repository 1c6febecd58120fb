//! CSV writers for the region and postcode tables.

use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::aggregate::{AggregationRow, PostcodeRow, RegionRow};
use crate::pipeline::brackets::BracketTable;
use crate::{PipelineError, PipelineResult};

pub const TOTAL_SALES_HEADER: &str = "Total Sales";
pub const REJECTED_HEADER: &str = "rejected_multiple_transactions";
pub const UNDATED_HEADER: &str = "undated_transactions";
pub const LIABILITY_HEADER: &str = "liability_estimate";

const PARTIAL_SUFFIX: &str = ".partial";
const PREVIOUS_SUFFIX: &str = ".previous";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTables {
    pub region_path: PathBuf,
    pub postcode_path: PathBuf,
}

pub fn region_headers(brackets: &BracketTable) -> Vec<String> {
    let mut headers = vec!["pcon".to_string()];
    headers.extend(brackets.labels().iter().cloned());
    headers.extend(
        [TOTAL_SALES_HEADER, REJECTED_HEADER, UNDATED_HEADER, LIABILITY_HEADER].map(str::to_string),
    );
    headers
}

pub fn postcode_headers(brackets: &BracketTable) -> Vec<String> {
    let mut headers = ["postcode_clean", "postcode_label", "lat", "long"]
        .map(str::to_string)
        .to_vec();
    headers.extend(brackets.labels().iter().cloned());
    headers.extend([TOTAL_SALES_HEADER, REJECTED_HEADER, UNDATED_HEADER].map(str::to_string));
    headers
}

/// Writes both tables into `out_dir`. Each file is staged under a `.partial`
/// name and only renamed once both are complete. If the second rename fails the
/// first is rolled back, restoring any region table that was there before.
pub fn write_tables(
    out_dir: &Path,
    region_file: &str,
    postcode_file: &str,
    regions: &[RegionRow],
    postcodes: &[PostcodeRow],
    brackets: &BracketTable,
) -> PipelineResult<WrittenTables> {
    fs::create_dir_all(out_dir)
        .map_err(|error| PipelineError::output_write_failed(out_dir, &error.to_string()))?;

    let region_path = out_dir.join(region_file);
    let postcode_path = out_dir.join(postcode_file);
    let region_partial = sibling_path(&region_path, PARTIAL_SUFFIX);
    let postcode_partial = sibling_path(&postcode_path, PARTIAL_SUFFIX);

    let staged = write_region_table(&region_partial, regions, brackets)
        .and_then(|()| write_postcode_table(&postcode_partial, postcodes, brackets));
    if let Err(error) = staged {
        let _ = fs::remove_file(&region_partial);
        let _ = fs::remove_file(&postcode_partial);
        return Err(error);
    }

    commit_pair(
        (region_partial.as_path(), region_path.as_path()),
        (postcode_partial.as_path(), postcode_path.as_path()),
    )?;

    tracing::info!(
        region_path = %region_path.display(),
        postcode_path = %postcode_path.display(),
        "wrote output tables"
    );
    Ok(WrittenTables {
        region_path,
        postcode_path,
    })
}

fn commit_pair(first: (&Path, &Path), second: (&Path, &Path)) -> PipelineResult<()> {
    let (first_partial, first_target) = first;
    let (second_partial, second_target) = second;
    let previous = sibling_path(first_target, PREVIOUS_SUFFIX);
    let kept_previous = first_target.is_file() && fs::rename(first_target, &previous).is_ok();
    let restore_previous = || {
        if kept_previous {
            let _ = fs::rename(&previous, first_target);
        }
    };

    if let Err(error) = fs::rename(first_partial, first_target) {
        let _ = fs::remove_file(first_partial);
        let _ = fs::remove_file(second_partial);
        restore_previous();
        return Err(PipelineError::output_write_failed(
            first_target,
            &error.to_string(),
        ));
    }
    if let Err(error) = fs::rename(second_partial, second_target) {
        let _ = fs::remove_file(first_target);
        let _ = fs::remove_file(second_partial);
        restore_previous();
        return Err(PipelineError::output_write_failed(
            second_target,
            &error.to_string(),
        ));
    }
    if kept_previous {
        let _ = fs::remove_file(&previous);
    }
    Ok(())
}

pub fn write_region_table(
    path: &Path,
    rows: &[RegionRow],
    brackets: &BracketTable,
) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|error| write_error(path, &error))?;
    writer
        .write_record(region_headers(brackets))
        .map_err(|error| write_error(path, &error))?;
    for row in rows {
        let mut record = vec![row.row.unit_code.clone()];
        record.extend(count_columns(&row.row));
        record.push(row.liability_estimate.to_string());
        writer
            .write_record(&record)
            .map_err(|error| write_error(path, &error))?;
    }
    writer
        .flush()
        .map_err(|error| PipelineError::output_write_failed(path, &error.to_string()))
}

pub fn write_postcode_table(
    path: &Path,
    rows: &[PostcodeRow],
    brackets: &BracketTable,
) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|error| write_error(path, &error))?;
    writer
        .write_record(postcode_headers(brackets))
        .map_err(|error| write_error(path, &error))?;
    for row in rows {
        let (lat, long) = match row.coordinates {
            Some(coordinates) => (
                coordinates.latitude.to_string(),
                coordinates.longitude.to_string(),
            ),
            None => (String::new(), String::new()),
        };
        let mut record = vec![row.row.unit_code.clone(), row.postcode_label.clone(), lat, long];
        record.extend(count_columns(&row.row));
        writer
            .write_record(&record)
            .map_err(|error| write_error(path, &error))?;
    }
    writer
        .flush()
        .map_err(|error| PipelineError::output_write_failed(path, &error.to_string()))
}

fn count_columns(row: &AggregationRow) -> Vec<String> {
    let mut columns = row
        .band_counts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<String>>();
    columns.push(row.total_sales.to_string());
    columns.push(row.rejected_duplicates.to_string());
    columns.push(row.date_unparseable.to_string());
    columns
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_error(path: &Path, error: &csv::Error) -> PipelineError {
    PipelineError::output_write_failed(path, &error.to_string())
}
