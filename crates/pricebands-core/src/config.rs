use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineSettings;
use crate::pipeline::brackets::{BracketTable, DEFAULT_RATES, DEFAULT_UPPER_BOUNDS, RateTable};
use crate::{PipelineError, PipelineResult};

pub const DEFAULT_REGION_FILE: &str = "region_value_bands.csv";
pub const DEFAULT_POSTCODE_FILE: &str = "postcode_value_bands.csv";

/// Run configuration as read from TOML. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub brackets: BracketsConfig,
    pub liability: LiabilityConfig,
    pub batch: BatchConfig,
    pub filters: FiltersConfig,
    pub price_index: PriceIndexConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BracketsConfig {
    /// Whole-pound upper bounds of the four lower bands.
    pub upper_bounds: Vec<i64>,
}

impl Default for BracketsConfig {
    fn default() -> Self {
        Self {
            upper_bounds: DEFAULT_UPPER_BOUNDS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiabilityConfig {
    /// Per-sale amount in pounds for each band, lowest first.
    pub rates: Vec<f64>,
}

impl Default for LiabilityConfig {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub enabled: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    pub exclude_other_property_type: bool,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            exclude_other_property_type: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceIndexConfig {
    /// Preamble lines above the header row of the wide price-index sheet.
    pub header_row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub region_file: String,
    pub postcode_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            region_file: DEFAULT_REGION_FILE.to_string(),
            postcode_file: DEFAULT_POSTCODE_FILE.to_string(),
        }
    }
}

impl RunConfig {
    /// Parses TOML, falling back to defaults for anything omitted.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Defaults when `path` is `None`; otherwise the file must exist and parse.
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|error| PipelineError::configuration_unreadable(path, &error.to_string()))?;
        let config = Self::from_toml(&contents)
            .map_err(|error| PipelineError::configuration_unreadable(path, error.message()))?;
        tracing::debug!(path = %path.display(), "loaded run configuration");
        Ok(config)
    }

    /// Builds the bracket and rate tables, rejecting malformed values.
    pub fn validate(&self) -> PipelineResult<PipelineSettings> {
        let brackets = BracketTable::new(&self.brackets.upper_bounds)?;
        let rates = RateTable::new(&self.liability.rates)?;
        validate_file_name("output.region_file", &self.output.region_file)?;
        validate_file_name("output.postcode_file", &self.output.postcode_file)?;
        if self.output.region_file == self.output.postcode_file {
            return Err(PipelineError::configuration_invalid(
                "output.postcode_file",
                "must differ from output.region_file",
            ));
        }

        Ok(PipelineSettings {
            brackets,
            rates,
            batch_correction: self.batch.enabled,
            exclude_other_property_type: self.filters.exclude_other_property_type,
        })
    }
}

fn validate_file_name(field: &str, value: &str) -> PipelineResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::configuration_invalid(field, "must not be empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(PipelineError::configuration_invalid(
            field,
            "must be a file name, not a path; use --out-dir to pick the directory",
        ));
    }
    Ok(())
}
