use std::path::Path;

use crate::PipelineResult;
use crate::config::RunConfig;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{BandContract, ConfigData};
use crate::pipeline::brackets::ValueBracket;
use crate::pipeline::money::Money;

#[derive(Debug, Default)]
pub struct ConfigShowOptions<'a> {
    pub config_path: Option<&'a Path>,
}

pub fn show() -> PipelineResult<SuccessEnvelope> {
    show_with_options(ConfigShowOptions { config_path: None })
}

#[doc(hidden)]
pub fn show_with_options(options: ConfigShowOptions<'_>) -> PipelineResult<SuccessEnvelope> {
    let config = RunConfig::load(options.config_path)?;
    let settings = config.validate()?;

    let bounds = settings.brackets.upper_bounds();
    let brackets = ValueBracket::all()
        .map(|bracket| {
            let index = bracket.index();
            let lower = if index == 0 {
                Money::ZERO
            } else {
                bounds[index - 1]
            };
            BandContract {
                label: settings.brackets.label(bracket).to_string(),
                lower: lower.as_pounds_f64(),
                upper: bounds.get(index).map(|upper| upper.as_pounds_f64()),
                rate: settings.rates.rate(bracket).as_pounds_f64(),
            }
        })
        .collect::<Vec<BandContract>>();

    let data = ConfigData {
        config_path: options.config_path.map(|path| path.display().to_string()),
        brackets,
        batch_correction: settings.batch_correction,
        exclude_other_property_type: settings.exclude_other_property_type,
        price_index_header_row: config.price_index.header_row,
        region_file: config.output.region_file,
        postcode_file: config.output.postcode_file,
    };

    success("config show", data)
}
