mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::error::ErrorKind;
use pricebands_core::PipelineError;
use stdout_io::write_stdout_text;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const ROOT_HELP: &str = "pricebands - value-band summaries of high-value property sales

Usage:
  pricebands <command>

Start here:
  pricebands run --help
  pricebands run --dry-run --transactions <pp.csv> --geography <nspl.csv> --price-index <index.csv>
  pricebands config show
";

const LOG_ENV: &str = "PRICEBANDS_LOG";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let parsed = cli::parse_from(&raw_args);
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                if write_stdout_text(&err.to_string()).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }
            let command_hint = if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(&raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                PipelineError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    init_tracing(cli.verbose);
    let mode = output::mode_for_command(&cli.command);

    let dispatched = dispatch::dispatch(&cli);
    match dispatched {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = %error.code, "command failed");
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

/// Logs go to stderr so stdout stays parseable under `--json`.
///
/// `PRICEBANDS_LOG` wins over `RUST_LOG`; `--verbose` lifts the default from
/// `warn` to `info` when neither is set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let directives = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Strips clap's trailing boilerplate (Usage line, "For more information" hint)
/// so our "What to do next" section is the single source of guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Builds the subcommand path from raw CLI args for use in help hints.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let non_flags: Vec<&str> = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect();

    let hint = match non_flags.as_slice() {
        ["run", ..] => Some("run"),
        ["config", "show", ..] => Some("config show"),
        ["config", ..] => Some("config"),
        _ => None,
    };
    hint.map(std::string::ToString::to_string)
}

fn exit_code_for_error(error: &PipelineError) -> ExitCode {
    if is_internal_error(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn is_internal_error(error: &PipelineError) -> bool {
    error.code.starts_with("internal_") || error.code == "output_write_failed"
}

#[cfg(test)]
mod tests {
    use pricebands_core::PipelineError;

    use super::{command_path_from_args, is_internal_error, strip_clap_boilerplate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn strips_usage_and_more_information_lines() {
        let message = "error: unexpected argument '--nope' found\n\nUsage: pricebands run\n\nFor more information, try '--help'.\n";
        assert_eq!(
            strip_clap_boilerplate(message),
            "error: unexpected argument '--nope' found"
        );
    }

    #[test]
    fn command_path_skips_flag_values_only_by_prefix() {
        assert_eq!(
            command_path_from_args(&args(&["pricebands", "config", "show", "--json"])),
            Some("config show".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["pricebands", "--verbose", "run", "--dry-run"])),
            Some("run".to_string())
        );
        assert_eq!(command_path_from_args(&args(&["pricebands", "nope"])), None);
    }

    #[test]
    fn write_failures_are_internal_but_input_errors_are_not() {
        let write_failed = PipelineError::new("output_write_failed", "disk full", Vec::new());
        let missing = PipelineError::new("missing_source", "absent", Vec::new());
        let serialization = PipelineError::internal_serialization("boom");
        assert!(is_internal_error(&write_failed));
        assert!(is_internal_error(&serialization));
        assert!(!is_internal_error(&missing));
    }
}
