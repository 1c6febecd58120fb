use std::collections::HashSet;

use crate::pipeline::normalize::{PropertyIdentityKey, normalize_postcode};
use crate::pipeline::types::Transaction;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DiscardReason {
    DateUnparseable,
    OlderDuplicate,
}

/// A row left out of the unique set. Only what unit-level accounting needs is
/// retained, not the whole transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedSale {
    pub source_row_index: usize,
    pub normalized_postcode: String,
    pub reason: DiscardReason,
}

#[derive(Debug, Clone)]
pub struct DedupeResult {
    /// One sale per identity key, in input order.
    pub unique: Vec<Transaction>,
    pub discarded: Vec<DiscardedSale>,
}

impl DedupeResult {
    pub fn count(&self, reason: DiscardReason) -> usize {
        self.discarded
            .iter()
            .filter(|sale| sale.reason == reason)
            .count()
    }
}

/// Keeps the most recent sale per property.
///
/// Undated rows cannot be ordered and are dropped before deduplication. Among
/// dated rows the latest `sale_date` wins; equal dates keep the row that came
/// first in the input.
pub fn dedupe_latest_sales(transactions: Vec<Transaction>) -> DedupeResult {
    let mut discarded = Vec::new();
    let mut dated = Vec::with_capacity(transactions.len());

    for (index, transaction) in transactions.iter().enumerate() {
        match transaction.sale_date {
            Some(sale_date) => dated.push((index, sale_date)),
            None => discarded.push(DiscardedSale {
                source_row_index: index,
                normalized_postcode: normalize_postcode(&transaction.raw_postcode),
                reason: DiscardReason::DateUnparseable,
            }),
        }
    }

    // Stable: ties stay in input order.
    dated.sort_by(|left, right| right.1.cmp(&left.1));

    let mut winners: HashSet<PropertyIdentityKey> = HashSet::with_capacity(dated.len());
    let mut kept_indexes = Vec::new();
    for (index, _) in dated {
        let key = PropertyIdentityKey::from_transaction(&transactions[index]);
        if winners.contains(&key) {
            discarded.push(DiscardedSale {
                source_row_index: index,
                normalized_postcode: key.postcode().to_string(),
                reason: DiscardReason::OlderDuplicate,
            });
            continue;
        }
        winners.insert(key);
        kept_indexes.push(index);
    }
    drop(winners);

    kept_indexes.sort_unstable();
    discarded.sort_by_key(|sale| sale.source_row_index);

    let mut slots = transactions.into_iter().map(Some).collect::<Vec<Option<Transaction>>>();
    let unique = kept_indexes
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect::<Vec<Transaction>>();

    let result = DedupeResult { unique, discarded };
    tracing::info!(
        kept = result.unique.len(),
        older_duplicates = result.count(DiscardReason::OlderDuplicate),
        undated = result.count(DiscardReason::DateUnparseable),
        "identity deduplication finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DiscardReason, dedupe_latest_sales};
    use crate::pipeline::money::Money;
    use crate::pipeline::types::{PropertyType, Transaction};

    fn sale(postcode: &str, paon: &str, saon: &str, pounds: i64, date: Option<&str>) -> Transaction {
        Transaction {
            price: Money::from_pounds(pounds),
            sale_date: date.and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()),
            raw_postcode: postcode.to_string(),
            property_type: PropertyType::Detached,
            primary_address_component: paon.to_string(),
            secondary_address_component: saon.to_string(),
        }
    }

    #[test]
    fn keeps_only_the_latest_sale_of_a_property() {
        let result = dedupe_latest_sales(vec![
            sale("AB1 2CD", "1", "A", 1_000_000, Some("2020-01-01")),
            sale("AB1 2CD", "1", "A", 1_200_000, Some("2021-06-01")),
        ]);
        assert_eq!(result.unique.len(), 1);
        assert_eq!(result.unique[0].price, Money::from_pounds(1_200_000));
        assert_eq!(result.count(DiscardReason::OlderDuplicate), 1);
        assert_eq!(result.discarded[0].source_row_index, 0);
        assert_eq!(result.discarded[0].normalized_postcode, "AB12CD");
    }

    #[test]
    fn same_day_ties_keep_the_first_row_in_input_order() {
        let result = dedupe_latest_sales(vec![
            sale("AB1 2CD", "1", "", 700_000, Some("2021-06-01")),
            sale("ab12cd", "1", "", 900_000, Some("2021-06-01")),
        ]);
        assert_eq!(result.unique.len(), 1);
        assert_eq!(result.unique[0].price, Money::from_pounds(700_000));
    }

    #[test]
    fn undated_rows_are_excluded_but_reported() {
        let result = dedupe_latest_sales(vec![
            sale("AB1 2CD", "1", "", 700_000, None),
            sale("AB1 2CD", "2", "", 900_000, Some("2021-06-01")),
        ]);
        assert_eq!(result.unique.len(), 1);
        assert_eq!(result.count(DiscardReason::DateUnparseable), 1);
        assert_eq!(result.discarded[0].reason, DiscardReason::DateUnparseable);
    }

    #[test]
    fn rerunning_on_its_own_output_is_a_no_op() {
        let first = dedupe_latest_sales(vec![
            sale("AB1 2CD", "1", "", 100, Some("2020-01-01")),
            sale("AB1 2CD", "1", "", 200, Some("2022-01-01")),
            sale("AB1 2CD", "2", "", 300, Some("2019-01-01")),
            sale("CD3 4EF", "", "", 400, Some("2018-01-01")),
            sale("CD3 4EF", "", "", 500, None),
        ]);
        let second = dedupe_latest_sales(first.unique.clone());
        assert_eq!(second.unique, first.unique);
        assert!(second.discarded.is_empty());
    }

    #[test]
    fn output_preserves_input_order_of_winners() {
        let result = dedupe_latest_sales(vec![
            sale("AB1 2CD", "9", "", 1, Some("2010-01-01")),
            sale("AB1 2CD", "1", "", 2, Some("2020-01-01")),
        ]);
        let prices = result
            .unique
            .iter()
            .map(|row| row.price)
            .collect::<Vec<Money>>();
        assert_eq!(prices, vec![Money::from_pounds(1), Money::from_pounds(2)]);
    }
}
