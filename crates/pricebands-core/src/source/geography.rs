use std::io::Read;
use std::path::Path;

use crate::pipeline::types::{Coordinates, RegionRecord};
use crate::source::{GEOGRAPHY_SOURCE, field, header_names, index_by_name, open_source};
use crate::{PipelineError, PipelineResult};

const REGION_HEADER: &str = "pcon";
const LABEL_HEADERS: [&str; 2] = ["pcds", "pcd"];
const LATITUDE_HEADER: &str = "lat";
const LONGITUDE_HEADER: &str = "long";

/// Reads an NSPL-style postcode lookup. Records keep the display postcode in
/// both `normalized_postcode` and `postcode_label`; the resolver normalizes
/// at load.
pub fn load_geography(path: &Path) -> PipelineResult<Vec<RegionRecord>> {
    let file = open_source(GEOGRAPHY_SOURCE, path)?;
    let records = read_geography(file)?;
    tracing::info!(path = %path.display(), rows = records.len(), "loaded geography lookup");
    Ok(records)
}

pub fn read_geography<R: Read>(reader: R) -> PipelineResult<Vec<RegionRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .byte_headers()
        .map(header_names)
        .map_err(|error| {
            PipelineError::source_malformed(GEOGRAPHY_SOURCE, 1, "header", &error.to_string())
        })?;
    let columns = index_by_name(&headers);

    let region_column = columns.get(REGION_HEADER).copied();
    let label_column = LABEL_HEADERS
        .iter()
        .find_map(|name| columns.get(name).copied());
    let (Some(region_column), Some(label_column)) = (region_column, label_column) else {
        return Err(PipelineError::source_schema_mismatch(
            GEOGRAPHY_SOURCE,
            vec![LABEL_HEADERS[0].to_string(), REGION_HEADER.to_string()],
            headers,
        ));
    };
    let coordinate_columns = columns
        .get(LATITUDE_HEADER)
        .copied()
        .zip(columns.get(LONGITUDE_HEADER).copied());

    let mut records = Vec::new();
    for (index, result) in reader.byte_records().enumerate() {
        let record = result.map_err(|error| {
            PipelineError::source_malformed(
                GEOGRAPHY_SOURCE,
                index as u64 + 2,
                "record",
                &error.to_string(),
            )
        })?;
        let postcode_label = field(&record, label_column);
        records.push(RegionRecord {
            region_code: field(&record, region_column),
            normalized_postcode: postcode_label.clone(),
            postcode_label,
            coordinates: coordinate_columns
                .and_then(|(lat, long)| parse_coordinates(&field(&record, lat), &field(&record, long))),
        });
    }
    Ok(records)
}

fn parse_coordinates(latitude: &str, longitude: &str) -> Option<Coordinates> {
    let latitude = latitude.parse::<f64>().ok().filter(|value| value.is_finite())?;
    let longitude = longitude.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}
