use std::collections::HashMap;

use crate::pipeline::normalize::normalize_postcode;
use crate::pipeline::types::RegionRecord;

/// Normalized postcode → region lookup.
#[derive(Debug, Clone, Default)]
pub struct GeographyResolver {
    records: HashMap<String, RegionRecord>,
    discarded_without_region: usize,
    duplicates_ignored: usize,
}

impl GeographyResolver {
    /// Entries without a region code are dropped; on duplicate postcodes the
    /// first record seen wins. Postcodes are re-normalized so callers may pass
    /// raw lookup values.
    pub fn from_records(records: impl IntoIterator<Item = RegionRecord>) -> Self {
        let mut resolver = Self::default();
        for mut record in records {
            record.region_code = record.region_code.trim().to_string();
            if record.region_code.is_empty() {
                resolver.discarded_without_region += 1;
                continue;
            }
            record.normalized_postcode = normalize_postcode(&record.normalized_postcode);
            if resolver.records.contains_key(&record.normalized_postcode) {
                resolver.duplicates_ignored += 1;
                continue;
            }
            resolver
                .records
                .insert(record.normalized_postcode.clone(), record);
        }
        resolver
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn discarded_without_region(&self) -> usize {
        self.discarded_without_region
    }

    pub fn duplicates_ignored(&self) -> usize {
        self.duplicates_ignored
    }

    /// Looks up an already-normalized postcode.
    pub fn resolve(&self, normalized_postcode: &str) -> Option<&RegionRecord> {
        self.records.get(normalized_postcode)
    }
}
