use std::collections::HashMap;

use chrono::NaiveDate;

use crate::pipeline::types::PriceIndexPoint;

/// Sparse (region, quarter-end) → median price lookup.
///
/// The latest quarter is global: the maximum quarter-end present anywhere in
/// the index, not the latest quarter each region happens to have.
#[derive(Debug, Clone, Default)]
pub struct PriceIndexTable {
    points: HashMap<(String, NaiveDate), f64>,
    latest_quarter: Option<NaiveDate>,
    duplicates_ignored: usize,
}

impl PriceIndexTable {
    /// First point seen for a (region, quarter) pair wins.
    pub fn from_points(points: impl IntoIterator<Item = PriceIndexPoint>) -> Self {
        let mut table = Self::default();
        for point in points {
            let key = (point.region_code, point.quarter_end_date);
            if table.points.contains_key(&key) {
                table.duplicates_ignored += 1;
                continue;
            }
            table.latest_quarter = Some(match table.latest_quarter {
                Some(current) => current.max(key.1),
                None => key.1,
            });
            table.points.insert(key, point.median_price);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest_quarter(&self) -> Option<NaiveDate> {
        self.latest_quarter
    }

    pub fn duplicates_ignored(&self) -> usize {
        self.duplicates_ignored
    }

    pub fn median_at(&self, region_code: &str, quarter_end: NaiveDate) -> Option<f64> {
        self.points
            .get(&(region_code.to_string(), quarter_end))
            .copied()
    }

    pub fn latest_median(&self, region_code: &str) -> Option<f64> {
        self.median_at(region_code, self.latest_quarter?)
    }
}
