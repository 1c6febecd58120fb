use chrono::{Datelike, NaiveDate};

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part (`2020-01-01 00:00`).
pub fn parse_sale_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10)?;
    if !looks_like_iso_date(date_part) {
        return None;
    }
    let rest = &trimmed[10..];
    if !rest.is_empty() && !rest.starts_with([' ', 'T']) {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Last calendar day of the quarter containing `date`.
pub fn quarter_end(date: NaiveDate) -> NaiveDate {
    let quarter_end_month = ((date.month() - 1) / 3 + 1) * 3;
    month_end(date.year(), quarter_end_month).unwrap_or(date)
}

pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
}

/// Parses wide-index headers such as `Year ending Mar 2025` into the last day
/// of the named month. Unrecognised month tokens fall back to December.
pub fn parse_quarter_label(label: &str) -> Option<NaiveDate> {
    let tokens = label.split_whitespace().collect::<Vec<&str>>();
    let [.., month_token, year_token] = tokens.as_slice() else {
        return None;
    };
    let year = year_token.parse::<i32>().ok()?;
    let month = match month_token.to_ascii_lowercase().as_str() {
        "mar" => 3,
        "jun" => 6,
        "sep" => 9,
        _ => 12,
    };
    month_end(year, month)
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
