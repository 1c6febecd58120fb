use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extended help shown after `pricebands run --help`.
pub const RUN_AFTER_HELP: &str = "\
Inputs:
  --transactions  Price Paid extract, no header row. Columns used by position:
                  1 price, 2 date, 3 postcode, 4 property type (D/S/T/F/O),
                  7 primary address, 8 secondary address.
  --geography     Postcode lookup with headers `pcon` and `pcds` (or `pcd`);
                  optional `lat` and `long`.
  --price-index   Wide regional median-price sheet with an `Area Code` column
                  and one `Year ending <Mon> <YYYY>` column per quarter. Set
                  `[price_index] header_row` to skip preamble lines.

  Each input path may also come from PRICEBANDS_TRANSACTIONS,
  PRICEBANDS_GEOGRAPHY, or PRICEBANDS_PRICE_INDEX.

Input Troubleshooting:
  missing_source          A path does not point at a file.
  source_schema_mismatch  Required headers are absent; compare with the list above.
  source_malformed        A row could not be read; the message names row and field.
  configuration_invalid   Run `pricebands config show --config <file>` to validate.

What to do next:
  1. Run `pricebands run --dry-run ...` and review the accounting summary.
  2. Rerun without `--dry-run` to write the region and postcode tables.
";

#[derive(Debug, Parser)]
#[command(
    name = "pricebands",
    version,
    about = "value-band summaries of high-value property sales",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Log pipeline progress to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the region and postcode value-band tables
    #[command(after_long_help = RUN_AFTER_HELP)]
    Run {
        /// Price Paid transactions CSV
        #[arg(long, env = "PRICEBANDS_TRANSACTIONS", value_name = "PATH")]
        transactions: Option<PathBuf>,
        /// Postcode-to-region lookup CSV
        #[arg(long, env = "PRICEBANDS_GEOGRAPHY", value_name = "PATH")]
        geography: Option<PathBuf>,
        /// Wide regional median-price CSV
        #[arg(long, env = "PRICEBANDS_PRICE_INDEX", value_name = "PATH")]
        price_index: Option<PathBuf>,
        /// TOML run configuration
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Directory for the output tables (default: current directory)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
        /// Compute and report without writing any file
        #[arg(long)]
        dry_run: bool,
        /// Emit structured JSON object output for machine parsing
        #[arg(long)]
        json: bool,
    },
    /// Inspect the effective run configuration
    #[command(arg_required_else_help = true)]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Show validated bands, rates and switches
    Show {
        /// TOML run configuration
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Emit structured JSON object output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
