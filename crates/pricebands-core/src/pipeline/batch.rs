use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;

use crate::pipeline::money::Money;
use crate::pipeline::normalize::normalize_postcode;
use crate::pipeline::types::Transaction;

/// Policy for spotting portfolio sales recorded as repeated full-price rows.
///
/// Rows sharing a group key form one candidate batch; every member of a batch
/// with more than one row has its price divided by `divisor(group_size)`.
/// Known false positive: distinct same-day, same-price sales in one postcode
/// (e.g. identical new-build flats) are also split.
pub trait BatchSaleStrategy {
    type Key: Eq + Hash;

    fn name(&self) -> &'static str;

    /// `None` keeps the row out of every batch.
    fn group_key(&self, transaction: &Transaction) -> Option<Self::Key>;

    fn divisor(&self, group_size: usize) -> usize;
}

/// Groups on (normalized postcode, sale date, price) and divides by group size.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioSplit;

impl BatchSaleStrategy for PortfolioSplit {
    type Key = (String, NaiveDate, Money);

    fn name(&self) -> &'static str {
        "portfolio_split"
    }

    fn group_key(&self, transaction: &Transaction) -> Option<Self::Key> {
        let sale_date = transaction.sale_date?;
        Some((
            normalize_postcode(&transaction.raw_postcode),
            sale_date,
            transaction.price,
        ))
    }

    fn divisor(&self, group_size: usize) -> usize {
        group_size
    }
}

/// Leaves every price untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrection;

impl BatchSaleStrategy for NoCorrection {
    type Key = ();

    fn name(&self) -> &'static str {
        "none"
    }

    fn group_key(&self, _transaction: &Transaction) -> Option<Self::Key> {
        None
    }

    fn divisor(&self, _group_size: usize) -> usize {
        1
    }
}

#[derive(Debug, Clone)]
pub struct BatchCorrection {
    pub transactions: Vec<Transaction>,
    pub strategy: &'static str,
    pub affected_groups: usize,
    pub affected_rows: usize,
    /// Σ(original − corrected) over affected rows.
    pub value_removed: Money,
}

/// Rewrites prices of batch members in place on the corrector's working copy.
/// Members are split in input order so remainder pence land deterministically.
pub fn correct_batch_sales<S>(mut transactions: Vec<Transaction>, strategy: &S) -> BatchCorrection
where
    S: BatchSaleStrategy,
{
    let mut groups: HashMap<S::Key, Vec<usize>> = HashMap::new();
    for (index, transaction) in transactions.iter().enumerate() {
        if let Some(key) = strategy.group_key(transaction) {
            groups.entry(key).or_default().push(index);
        }
    }

    let mut affected_groups = 0;
    let mut affected_rows = 0;
    let mut value_removed = Money::ZERO;

    for members in groups.values() {
        if members.len() < 2 {
            continue;
        }
        let divisor = strategy.divisor(members.len());
        if divisor <= 1 {
            continue;
        }

        affected_groups += 1;
        for (position, index) in members.iter().enumerate() {
            let Some(transaction) = transactions.get_mut(*index) else {
                continue;
            };
            let original = transaction.price;
            let corrected = original.share(divisor, position);
            transaction.price = corrected;
            value_removed = value_removed + (original - corrected);
            affected_rows += 1;
        }
    }

    tracing::info!(
        strategy = strategy.name(),
        affected_groups,
        affected_rows,
        value_removed = %value_removed,
        "batch-sale correction finished"
    );

    BatchCorrection {
        transactions,
        strategy: strategy.name(),
        affected_groups,
        affected_rows,
        value_removed,
    }
}
