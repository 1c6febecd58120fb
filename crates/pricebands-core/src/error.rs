use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const RUN_HELP_COMMAND: &str = "pricebands run --help";
pub(crate) const RUN_HELP_SECTION_TITLE: &str = "Input Troubleshooting";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl PipelineError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_run_help_data(self, data: Value) -> Self {
        self.with_data(merge_run_help_data(data))
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `pricebands {cmd} --help` for usage."),
            None => "Run `pricebands --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    /// A required input table is absent. Fatal before any stage runs.
    pub fn missing_source(source: &str, path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "missing_source",
            &format!("The {source} input was not found at `{location}`."),
            vec![
                format!("Check that `{location}` exists and is readable."),
                format!("Pass the {source} file explicitly; run `{RUN_HELP_COMMAND}` for flags."),
            ],
        )
        .with_run_help_data(json!({
            "source": source,
            "path": location,
        }))
    }

    pub fn source_unreadable(source: &str, path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "source_unreadable",
            &format!("The {source} input at `{location}` could not be read: {detail}"),
            vec![format!("Check file permissions on `{location}`.")],
        )
        .with_run_help_data(json!({
            "source": source,
            "path": location,
        }))
    }

    pub fn source_schema_mismatch(
        source: &str,
        required_headers: Vec<String>,
        actual_headers: Vec<String>,
    ) -> Self {
        let missing = required_headers
            .iter()
            .filter(|header| !actual_headers.contains(header))
            .cloned()
            .collect::<Vec<String>>();

        Self::new(
            "source_schema_mismatch",
            &format!(
                "The {source} input is missing required columns: {}.",
                missing.join(", ")
            ),
            vec![
                "Include all required headers; extra columns are ignored.".to_string(),
                format!("Run `{RUN_HELP_COMMAND}` to review the expected {source} layout."),
            ],
        )
        .with_run_help_data(json!({
            "source": source,
            "required_headers": required_headers,
            "missing_headers": missing,
            "actual_headers": actual_headers,
        }))
    }

    pub fn source_malformed(source: &str, row: u64, field: &str, detail: &str) -> Self {
        Self::new(
            "source_malformed",
            &format!("The {source} input has a malformed `{field}` at row {row}: {detail}"),
            vec![
                format!("Fix row {row} in the {source} file and rerun."),
                format!("Run `{RUN_HELP_COMMAND}` to review the expected {source} layout."),
            ],
        )
        .with_run_help_data(json!({
            "source": source,
            "row": row,
            "field": field,
        }))
    }

    pub fn configuration_invalid(field: &str, detail: &str) -> Self {
        Self::new(
            "configuration_invalid",
            &format!("Configuration value `{field}` is invalid: {detail}"),
            vec![
                format!("Correct `{field}` in your config file."),
                "Run `pricebands config show` to see the effective defaults.".to_string(),
            ],
        )
        .with_data(json!({
            "field": field,
        }))
    }

    pub fn configuration_unreadable(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "configuration_invalid",
            &format!("Config file `{location}` could not be loaded: {detail}"),
            vec![
                format!("Check that `{location}` exists and is valid TOML."),
                "Run `pricebands config show` to see the effective defaults.".to_string(),
            ],
        )
        .with_data(json!({
            "path": location,
        }))
    }

    pub fn output_write_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "output_write_failed",
            &format!("Could not write output to `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or choose another directory with `--out-dir`."
            )],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    /// Input and configuration problems the user can fix; everything else is internal.
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self.code.as_str(),
            "invalid_argument"
                | "missing_source"
                | "source_unreadable"
                | "source_schema_mismatch"
                | "source_malformed"
                | "configuration_invalid"
        )
    }
}

fn merge_run_help_data(mut data: Value) -> Value {
    if !data.is_object() {
        data = json!({});
    }

    if let Some(object) = data.as_object_mut() {
        object.insert(
            "help_command".to_string(),
            Value::String(RUN_HELP_COMMAND.to_string()),
        );
        object.insert(
            "help_section_title".to_string(),
            Value::String(RUN_HELP_SECTION_TITLE.to_string()),
        );
    }

    data
}

pub type PipelineResult<T> = Result<T, PipelineError>;
