//! CSV loaders for the three input tables. Each one is read to completion
//! before the pipeline starts.

pub mod geography;
pub mod price_index;
pub mod transactions;

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::{PipelineError, PipelineResult};

pub use geography::load_geography;
pub use price_index::load_price_index;
pub use transactions::load_transactions;

pub const TRANSACTIONS_SOURCE: &str = "transactions";
pub const GEOGRAPHY_SOURCE: &str = "geography";
pub const PRICE_INDEX_SOURCE: &str = "price index";

/// The three input files, checked for existence before anything is parsed.
#[derive(Debug, Clone)]
pub struct SourcePaths<'a> {
    pub transactions: &'a Path,
    pub geography: &'a Path,
    pub price_index: &'a Path,
}

impl SourcePaths<'_> {
    pub fn ensure_present(&self) -> PipelineResult<()> {
        for (source, path) in [
            (TRANSACTIONS_SOURCE, self.transactions),
            (GEOGRAPHY_SOURCE, self.geography),
            (PRICE_INDEX_SOURCE, self.price_index),
        ] {
            if !path.is_file() {
                return Err(PipelineError::missing_source(source, path));
            }
        }
        Ok(())
    }
}

pub(crate) fn open_source(source: &str, path: &Path) -> PipelineResult<File> {
    if !path.is_file() {
        return Err(PipelineError::missing_source(source, path));
    }
    File::open(path).map_err(|error| PipelineError::source_unreadable(source, path, &error.to_string()))
}

/// Extracts arrive as either UTF-8 or Latin-1. A field that is valid UTF-8 is
/// taken as such; otherwise every byte maps to the code point of the same value.
pub(crate) fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|byte| char::from(*byte)).collect(),
    }
}

pub(crate) fn field(record: &csv::ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|bytes| decode_field(bytes).trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn header_names(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|bytes| decode_field(bytes).trim().trim_start_matches('\u{feff}').to_string())
        .collect()
}

pub(crate) fn index_by_name(headers: &[String]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(headers.len());
    for (position, name) in headers.iter().enumerate() {
        index.entry(name.as_str()).or_insert(position);
    }
    index
}

/// 1-based data row number for error messages.
pub(crate) fn row_number(record: &csv::ByteRecord, fallback_index: usize) -> u64 {
    record
        .position()
        .map(|position| position.line())
        .unwrap_or(fallback_index as u64 + 1)
}
