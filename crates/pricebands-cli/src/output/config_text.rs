use std::io;

use serde_json::Value;

use super::format::{Column, key_value_rows, pounds, render_table_or_blocks, terminal_width};

pub fn render_config(data: &Value) -> io::Result<String> {
    let source = data
        .get("config_path")
        .and_then(Value::as_str)
        .map_or_else(|| "built-in defaults".to_string(), str::to_string);

    let mut lines = vec![format!("Configuration ({source})"), String::new()];

    let columns = [
        Column::left("Band"),
        Column::right("From"),
        Column::right("To"),
        Column::right("Rate"),
    ];
    let rows = data
        .get("brackets")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|band| {
            vec![
                band.get("label")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
                pounds(band.get("lower").and_then(Value::as_f64).unwrap_or(0.0)),
                band.get("upper")
                    .and_then(Value::as_f64)
                    .map_or_else(|| "-".to_string(), pounds),
                pounds(band.get("rate").and_then(Value::as_f64).unwrap_or(0.0)),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(render_table_or_blocks(
        &columns,
        &rows,
        terminal_width(),
        "Band",
    ));

    lines.push(String::new());
    lines.extend(key_value_rows(
        &[
            ("Batch correction:", on_off(data, "batch_correction")),
            (
                "Exclude type O:",
                on_off(data, "exclude_other_property_type"),
            ),
            (
                "Index header row:",
                data.get("price_index_header_row")
                    .and_then(Value::as_u64)
                    .unwrap_or(0)
                    .to_string(),
            ),
            ("Region file:", string(data, "region_file")),
            ("Postcode file:", string(data, "postcode_file")),
        ],
        2,
    ));

    Ok(lines.join("\n"))
}

fn on_off(data: &Value, key: &str) -> String {
    if data.get(key).and_then(Value::as_bool).unwrap_or(false) {
        "on".to_string()
    } else {
        "off".to_string()
    }
}

fn string(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string()
}
