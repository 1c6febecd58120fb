use std::io::Read;
use std::path::Path;

use crate::pipeline::date::parse_sale_date;
use crate::pipeline::money::Money;
use crate::pipeline::types::{PropertyType, Transaction};
use crate::source::{TRANSACTIONS_SOURCE, field, open_source, row_number};
use crate::{PipelineError, PipelineResult};

const PRICE_COLUMN: usize = 1;
const DATE_COLUMN: usize = 2;
const POSTCODE_COLUMN: usize = 3;
const PROPERTY_TYPE_COLUMN: usize = 4;
const PRIMARY_ADDRESS_COLUMN: usize = 7;
const SECONDARY_ADDRESS_COLUMN: usize = 8;
const MIN_COLUMNS: usize = 9;

/// Reads a headerless Price Paid extract.
pub fn load_transactions(path: &Path) -> PipelineResult<Vec<Transaction>> {
    let file = open_source(TRANSACTIONS_SOURCE, path)?;
    let transactions = read_transactions(file)?;
    tracing::info!(
        path = %path.display(),
        rows = transactions.len(),
        undated = transactions.iter().filter(|row| row.sale_date.is_none()).count(),
        "loaded transactions"
    );
    Ok(transactions)
}

pub fn read_transactions<R: Read>(reader: R) -> PipelineResult<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut transactions = Vec::new();
    let mut record = csv::ByteRecord::new();
    loop {
        let row = transactions.len() as u64 + 1;
        let has_record = reader.read_byte_record(&mut record).map_err(|error| {
            PipelineError::source_malformed(TRANSACTIONS_SOURCE, row, "record", &error.to_string())
        })?;
        if !has_record {
            break;
        }
        transactions.push(parse_record(&record, transactions.len())?);
    }
    Ok(transactions)
}

fn parse_record(record: &csv::ByteRecord, index: usize) -> PipelineResult<Transaction> {
    let row = row_number(record, index);
    if record.len() < MIN_COLUMNS {
        return Err(PipelineError::source_malformed(
            TRANSACTIONS_SOURCE,
            row,
            "columns",
            &format!("expected at least {MIN_COLUMNS} columns, found {}", record.len()),
        ));
    }

    let raw_price = field(record, PRICE_COLUMN);
    let Some(price) = Money::parse_pounds(&raw_price) else {
        return Err(PipelineError::source_malformed(
            TRANSACTIONS_SOURCE,
            row,
            "price",
            &format!("`{raw_price}` is not a price"),
        ));
    };

    let raw_date = field(record, DATE_COLUMN);
    let sale_date = parse_sale_date(&raw_date);
    if sale_date.is_none() {
        tracing::debug!(row, date = %raw_date, "sale date could not be parsed");
    }

    Ok(Transaction {
        price,
        sale_date,
        raw_postcode: field(record, POSTCODE_COLUMN),
        property_type: PropertyType::from_code(&field(record, PROPERTY_TYPE_COLUMN)),
        primary_address_component: field(record, PRIMARY_ADDRESS_COLUMN),
        secondary_address_component: field(record, SECONDARY_ADDRESS_COLUMN),
    })
}
