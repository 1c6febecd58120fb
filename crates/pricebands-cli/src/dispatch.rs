use pricebands_core::commands;
use pricebands_core::commands::config::ConfigShowOptions;
use pricebands_core::commands::run::RunOptions;
use pricebands_core::{PipelineResult, SuccessEnvelope};

use crate::cli::{Cli, Commands, ConfigCommand};

pub fn dispatch(cli: &Cli) -> PipelineResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Run {
            transactions,
            geography,
            price_index,
            config,
            out_dir,
            dry_run,
            json: _,
        } => commands::run::run_with_options(RunOptions {
            transactions: transactions.clone(),
            geography: geography.clone(),
            price_index: price_index.clone(),
            config_path: config.as_deref(),
            out_dir: out_dir.clone(),
            dry_run: *dry_run,
        }),
        Commands::Config { command } => match command {
            ConfigCommand::Show { config, .. } => {
                commands::config::show_with_options(ConfigShowOptions {
                    config_path: config.as_deref(),
                })
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::dispatch;

    #[test]
    fn config_show_dispatches_with_defaults() {
        let parsed = parse_from(["pricebands", "config", "show"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_ok());
            if let Ok(success) = response {
                assert_eq!(success.command, "config show");
            }
        }
    }

    #[test]
    fn run_with_absent_inputs_reports_missing_source() {
        let parsed = parse_from([
            "pricebands",
            "run",
            "--transactions",
            "/nonexistent/pp.csv",
            "--geography",
            "/nonexistent/nspl.csv",
            "--price-index",
            "/nonexistent/index.csv",
            "--dry-run",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_err());
            if let Err(error) = response {
                assert_eq!(error.code, "missing_source");
            }
        }
    }
}
