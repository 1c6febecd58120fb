use std::io;

use serde_json::Value;

use super::format::{Column, key_value_rows, pounds, render_table_or_blocks, terminal_width};

pub fn render_run(data: &Value) -> io::Result<String> {
    render_run_with_width(data, terminal_width())
}

fn render_run_with_width(data: &Value, width: usize) -> io::Result<String> {
    let dry_run = data.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
    let headline = if dry_run {
        "Dry run complete. No files were written."
    } else {
        "Run complete."
    };

    let mut lines = vec![headline.to_string(), String::new()];
    lines.extend(key_value_rows(
        &[("Run ID:", text(data, &["run_id"]))],
        2,
    ));

    lines.push(String::new());
    lines.push("Row accounting:".to_string());
    lines.extend(key_value_rows(
        &[
            ("Rows read:", count(data, &["accounting", "total_read"])),
            (
                "Other property type:",
                count(data, &["accounting", "other_property_excluded"]),
            ),
            (
                "Postcode not matched:",
                count(data, &["accounting", "geography_unresolved"]),
            ),
            (
                "Undated:",
                count(data, &["accounting", "date_unparseable"]),
            ),
            (
                "Superseded resales:",
                count(data, &["accounting", "rejected_duplicate"]),
            ),
            ("Unique kept:", count(data, &["accounting", "unique_kept"])),
        ],
        2,
    ));

    lines.push(String::new());
    lines.push("Corrections:".to_string());
    let value_removed = data
        .pointer("/batch_correction/value_removed")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    lines.extend(key_value_rows(
        &[
            (
                "Batch strategy:",
                text(data, &["batch_correction", "strategy"]),
            ),
            (
                "Batch sales split:",
                format!(
                    "{} rows in {} groups",
                    count(data, &["batch_correction", "affected_rows"]),
                    count(data, &["batch_correction", "affected_groups"])
                ),
            ),
            ("Value reallocated:", pounds(value_removed)),
            ("Uprated to:", text(data, &["valuation", "latest_quarter"])),
            (
                "Prices uprated:",
                format!(
                    "{} of {} index matches",
                    count(data, &["valuation", "uprated"]),
                    count(data, &["valuation", "historical_matches"])
                ),
            ),
            (
                "Sale dates:",
                format!(
                    "{} to {}",
                    text(data, &["valuation", "sale_range", "earliest"]),
                    text(data, &["valuation", "sale_range", "latest"])
                ),
            ),
        ],
        2,
    ));

    lines.push(String::new());
    lines.push(format!(
        "Regions: {}  Postcodes: {}",
        count(data, &["region_count"]),
        count(data, &["postcode_count"])
    ));
    lines.extend(render_top_regions(data, width));

    if let Some(outputs) = data.get("outputs") {
        lines.push(String::new());
        lines.push("Wrote:".to_string());
        lines.extend(key_value_rows(
            &[
                ("Region table:", text(outputs, &["region_table"])),
                ("Postcode table:", text(outputs, &["postcode_table"])),
            ],
            2,
        ));
    }

    let warnings = data
        .get("warnings")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        for warning in &warnings {
            lines.push(format!(
                "  - {} ({})",
                text(warning, &["message"]),
                text(warning, &["code"])
            ));
        }
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if dry_run {
        lines.push("  1. Rerun without `--dry-run` to write the tables.".to_string());
    } else {
        lines.push("  1. Open the region table to review band counts by constituency.".to_string());
    }

    Ok(lines.join("\n"))
}

fn render_top_regions(data: &Value, width: usize) -> Vec<String> {
    let rows = data
        .pointer("/top_regions/rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if rows.is_empty() {
        return Vec::new();
    }

    let labels = data
        .get("band_labels")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut columns = vec![Column::left("Region")];
    for label in &labels {
        columns.push(Column::right(label.as_str().unwrap_or("")));
    }
    columns.push(Column::right("Total"));
    columns.push(Column::right("Liability"));

    let cells = rows
        .iter()
        .map(|row| {
            let mut cells = vec![text(row, &["region_code"])];
            let band_counts = row
                .get("band_counts")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for index in 0..labels.len() {
                cells.push(
                    band_counts
                        .get(index)
                        .and_then(Value::as_u64)
                        .unwrap_or(0)
                        .to_string(),
                );
            }
            cells.push(count(row, &["total_sales"]));
            cells.push(pounds(
                row.get("liability_estimate")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
            ));
            cells
        })
        .collect::<Vec<Vec<String>>>();

    let truncated = data
        .pointer("/top_regions/truncated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let mut lines = vec![
        String::new(),
        if truncated {
            format!("Top {} regions by top band:", cells.len())
        } else {
            "Regions by top band:".to_string()
        },
    ];
    lines.extend(render_table_or_blocks(&columns, &cells, width, "Region"));
    lines
}

fn text(value: &Value, path: &[&str]) -> String {
    match lookup(value, path) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => "-".to_string(),
    }
}

fn count(value: &Value, path: &[&str]) -> String {
    lookup(value, path)
        .and_then(Value::as_u64)
        .unwrap_or(0)
        .to_string()
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}
