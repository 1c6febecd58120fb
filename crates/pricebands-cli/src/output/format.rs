use std::cmp;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub align: Align,
}

impl Column {
    pub fn left(name: &str) -> Self {
        Self {
            name: name.to_string(),
            align: Align::Left,
        }
    }

    pub fn right(name: &str) -> Self {
        Self {
            name: name.to_string(),
            align: Align::Right,
        }
    }
}

const INDENT: usize = 2;
const COLUMN_GAP: usize = 2;
const MIN_TABLE_COLUMN_WIDTH: usize = 6;

pub fn terminal_width() -> usize {
    let from_env = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    cmp::max(from_env, 40)
}

/// Display width in characters; band labels carry multi-byte `£` signs.
fn width_of(value: &str) -> usize {
    value.chars().count()
}

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    if entries.is_empty() {
        return Vec::new();
    }

    let label_width = entries
        .iter()
        .map(|(label, _)| width_of(label))
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

/// Renders `£12,345.67`, dropping pence when the amount is whole.
pub fn pounds(amount: f64) -> String {
    let negative = amount < 0.0;
    let pence = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(pence / 100);
    let fraction = pence % 100;
    let sign = if negative && pence > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}£{whole}")
    } else {
        format!("{sign}£{whole}.{fraction:02}")
    }
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn render_table_or_blocks(
    columns: &[Column],
    rows: &[Vec<String>],
    max_width: usize,
    block_label: &str,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let natural = natural_column_widths(columns, rows);
    let available = max_width.saturating_sub(INDENT);
    let gap_total = COLUMN_GAP * columns.len().saturating_sub(1);
    let budget = available.saturating_sub(gap_total);

    let Some(widths) = fit_widths_to_budget(&natural, budget) else {
        return render_blocks(columns, rows, block_label);
    };

    let mut output = Vec::with_capacity(rows.len() + 1);
    let header = columns
        .iter()
        .map(|column| column.name.clone())
        .collect::<Vec<String>>();
    output.push(format_row(columns, &header, &widths));
    for row in rows {
        output.push(format_row(columns, row, &widths));
    }
    output
}

fn natural_column_widths(columns: &[Column], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = columns
        .iter()
        .map(|column| cmp::max(width_of(&column.name), MIN_TABLE_COLUMN_WIDTH))
        .collect::<Vec<usize>>();

    for row in rows {
        for (index, value) in row.iter().enumerate() {
            if let Some(slot) = widths.get_mut(index) {
                *slot = cmp::max(*slot, width_of(value));
            }
        }
    }

    widths
}

/// Cells are never truncated, so a table that does not fit becomes blocks.
fn fit_widths_to_budget(natural: &[usize], budget: usize) -> Option<Vec<usize>> {
    if natural.iter().sum::<usize>() > budget {
        return None;
    }
    Some(natural.to_vec())
}

fn format_row(columns: &[Column], cells: &[String], widths: &[usize]) -> String {
    let mut pieces = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        let width = *widths.get(index).unwrap_or(&MIN_TABLE_COLUMN_WIDTH);
        let value = cells.get(index).map(String::as_str).unwrap_or("");

        let piece = match column.align {
            Align::Left => format!("{value:<width$}"),
            Align::Right => format!("{value:>width$}"),
        };
        pieces.push(piece);
    }

    let line = format!("{}{}", " ".repeat(INDENT), pieces.join("  "));
    line.trim_end().to_string()
}

fn render_blocks(columns: &[Column], rows: &[Vec<String>], block_label: &str) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }

    let labels = columns
        .iter()
        .map(|column| format!("{}:", column.name))
        .collect::<Vec<String>>();
    let label_width = labels.iter().map(|label| width_of(label)).max().unwrap_or(0);

    let mut output = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        output.push(format!("  {block_label} {}:", row_index + 1));

        for (column_index, label) in labels.iter().enumerate() {
            let value = row.get(column_index).map(String::as_str).unwrap_or("");
            output.push(format!("    {label:<label_width$}  {value}"));
        }

        if row_index + 1 < rows.len() {
            output.push(String::new());
        }
    }

    output
}
