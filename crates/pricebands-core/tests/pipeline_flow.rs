use std::fs;
use std::path::{Path, PathBuf};

use pricebands_core::commands::config::{ConfigShowOptions, show_with_options};
use pricebands_core::commands::run::{RunOptions, run_with_options};
use pricebands_core::contracts::envelope::failure_from_error;
use serde_json::Value;
use tempfile::{TempDir, tempdir};

fn write_file(path: &Path, body: &str) {
    let result = fs::write(path, body);
    assert!(result.is_ok());
}

fn price_paid_row(
    id: &str,
    price: &str,
    date: &str,
    postcode: &str,
    property_type: &str,
    paon: &str,
    saon: &str,
) -> String {
    format!(
        "\"{{{id}}}\",\"{price}\",\"{date}\",\"{postcode}\",\"{property_type}\",\"N\",\"F\",\"{paon}\",\"{saon}\",\"HIGH STREET\",\"\",\"TOWN\",\"DISTRICT\",\"COUNTY\",\"A\",\"A\"\n"
    )
}

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    transactions: PathBuf,
    geography: PathBuf,
    price_index: PathBuf,
}

fn fixture() -> std::io::Result<Fixture> {
    let dir = tempdir()?;
    let root = dir.path().to_path_buf();

    let transactions = root.join("pp.csv");
    let rows = [
        price_paid_row("A", "1000000", "2020-01-01 00:00", "AB1 2CD", "D", "1", "A"),
        price_paid_row("B", "1200000", "2021-06-01 00:00", "AB1 2CD", "D", "1", "A"),
        price_paid_row("C", "3000000", "2022-03-01 00:00", "XY9 9XY", "F", "1", ""),
        price_paid_row("D", "3000000", "2022-03-01 00:00", "XY9 9XY", "F", "2", ""),
        price_paid_row("E", "3000000", "2022-03-01 00:00", "XY9 9XY", "F", "3", ""),
        price_paid_row("F", "6000000", "2023-05-01 00:00", "CD3 4EF", "D", "10", ""),
        price_paid_row("G", "4000000", "2023-05-01 00:00", "ZZ9 9ZZ", "D", "1", ""),
        price_paid_row("H", "900000", "unknown", "AB1 2CD", "T", "7", ""),
        price_paid_row("I", "2200000", "2023-05-01 00:00", "AB1 2CD", "O", "9", ""),
    ];
    write_file(&transactions, &rows.concat());

    let geography = root.join("nspl.csv");
    write_file(
        &geography,
        "pcds,pcon,lat,long\nAB1 2CD,R1,57.1,-2.1\nXY9 9XY,R1,,\nCD3 4EF,R2,51.0,0.1\n",
    );

    let price_index = root.join("index.csv");
    write_file(
        &price_index,
        "Median prices\nArea Code,Area Name,Year ending Jun 2021,Year ending Dec 2024\nR1,North,200000,300000\nR2,South,:,500000\n",
    );

    Ok(Fixture {
        _dir: dir,
        root,
        transactions,
        geography,
        price_index,
    })
}

fn write_config(fixture: &Fixture, body: &str) -> PathBuf {
    let path = fixture.root.join("pricebands.toml");
    write_file(&path, body);
    path
}

fn options<'a>(fixture: &Fixture, config_path: Option<&'a Path>, dry_run: bool) -> RunOptions<'a> {
    RunOptions {
        transactions: Some(fixture.transactions.clone()),
        geography: Some(fixture.geography.clone()),
        price_index: Some(fixture.price_index.clone()),
        config_path,
        out_dir: Some(fixture.root.join("out")),
        dry_run,
    }
}

#[test]
fn full_run_writes_both_tables_and_balances_accounting() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let config = write_config(&fixture, "[price_index]\nheader_row = 1\n");

    let result = run_with_options(options(&fixture, Some(&config), false));
    assert!(result.is_ok());
    let Ok(envelope) = result else {
        return;
    };
    assert!(envelope.ok);
    assert_eq!(envelope.command, "run");

    let accounting = &envelope.data["accounting"];
    assert_eq!(accounting["total_read"], 9);
    assert_eq!(accounting["other_property_excluded"], 1);
    assert_eq!(accounting["geography_unresolved"], 1);
    assert_eq!(accounting["date_unparseable"], 1);
    assert_eq!(accounting["rejected_duplicate"], 1);
    assert_eq!(accounting["unique_kept"], 5);

    assert_eq!(envelope.data["batch_correction"]["affected_rows"], 3);
    assert_eq!(envelope.data["batch_correction"]["value_removed"], 6_000_000.0);
    assert_eq!(envelope.data["valuation"]["latest_quarter"], "2024-12-31");
    assert_eq!(envelope.data["valuation"]["uprated"], 1);
    assert_eq!(envelope.data["valuation"]["sale_range"]["earliest"], "2021-06-01");
    assert_eq!(envelope.data["top_regions"]["rows"][0]["region_code"], "R2");
    assert!(envelope.data["run_id"].as_str().unwrap_or_default().starts_with("run_"));

    let region_csv = fs::read_to_string(fixture.root.join("out/region_value_bands.csv"));
    assert!(region_csv.is_ok());
    if let Ok(body) = region_csv {
        let lines = body.lines().collect::<Vec<&str>>();
        assert_eq!(
            lines[0],
            "pcon,£0 - £2m,£2m - £2.5m,£2.5m - £3.5m,£3.5m - £5m,£5m+,Total Sales,rejected_multiple_transactions,undated_transactions,liability_estimate"
        );
        assert_eq!(lines[1], "R2,0,0,0,0,1,1,0,0,7500");
        assert_eq!(lines[2], "R1,4,0,0,0,0,4,1,1,0");
    }

    let postcode_csv = fs::read_to_string(fixture.root.join("out/postcode_value_bands.csv"));
    assert!(postcode_csv.is_ok());
    if let Ok(body) = postcode_csv {
        let lines = body.lines().collect::<Vec<&str>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "AB12CD,AB1 2CD,57.1,-2.1,1,0,0,0,0,1,1,1");
        assert_eq!(lines[3], "XY99XY,XY9 9XY,,,3,0,0,0,0,3,0,0");
    }
}

#[test]
fn dry_run_reports_without_writing() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let config = write_config(&fixture, "[price_index]\nheader_row = 1\n");

    let result = run_with_options(options(&fixture, Some(&config), true));
    assert!(result.is_ok());
    if let Ok(envelope) = result {
        assert_eq!(envelope.data["dry_run"], true);
        assert!(envelope.data.get("outputs").is_none());
        assert_eq!(envelope.data["region_count"], 2);
    }
    assert!(!fixture.root.join("out").exists());
}

#[test]
fn disabling_batch_correction_keeps_portfolio_prices() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let config = write_config(
        &fixture,
        "[price_index]\nheader_row = 1\n\n[batch]\nenabled = false\n\n[filters]\nexclude_other_property_type = false\n",
    );

    let result = run_with_options(options(&fixture, Some(&config), true));
    assert!(result.is_ok());
    if let Ok(envelope) = result {
        assert_eq!(envelope.data["batch_correction"]["strategy"], "none");
        assert_eq!(envelope.data["batch_correction"]["affected_rows"], 0);
        assert_eq!(envelope.data["accounting"]["other_property_excluded"], 0);
        assert_eq!(envelope.data["accounting"]["unique_kept"], 6);
    }
}

#[test]
fn missing_input_fails_before_any_output() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let mut run_options = options(&fixture, None, false);
    run_options.geography = Some(fixture.root.join("absent.csv"));

    let result = run_with_options(run_options);
    assert!(result.is_err());
    if let Err(error) = result {
        assert_eq!(error.code, "missing_source");
        assert!(error.message.contains("geography"));
        let failure = failure_from_error(&error);
        assert_eq!(
            failure.data.as_ref().and_then(|data| data.get("source")),
            Some(&Value::String("geography".to_string()))
        );
    }
    assert!(!fixture.root.join("out").exists());
}

#[test]
fn invalid_config_is_rejected_before_inputs_are_checked() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let config = write_config(&fixture, "[liability]\nrates = [100.0, 1.0, 2.0, 3.0, 4.0]\n");
    let mut run_options = options(&fixture, Some(&config), false);
    run_options.transactions = Some(fixture.root.join("absent.csv"));

    let result = run_with_options(run_options);
    assert!(result.is_err());
    if let Err(error) = result {
        assert_eq!(error.code, "configuration_invalid");
        assert!(error.message.contains("liability.rates"));
    }
}

#[test]
fn misaligned_price_index_header_is_a_schema_error() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };

    let result = run_with_options(options(&fixture, None, true));
    assert!(result.is_err());
    if let Err(error) = result {
        assert_eq!(error.code, "source_schema_mismatch");
        assert!(error.is_user_fixable());
    }
}

#[test]
fn missing_path_flag_is_an_invalid_argument() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let mut run_options = options(&fixture, None, true);
    run_options.price_index = None;

    let result = run_with_options(run_options);
    assert!(result.is_err());
    if let Err(error) = result {
        assert_eq!(error.code, "invalid_argument");
        assert!(error.message.contains("--price-index"));
    }
}

#[test]
fn config_show_reflects_file_overrides() {
    let fixture = fixture();
    assert!(fixture.is_ok());
    let Ok(fixture) = fixture else {
        return;
    };
    let config = write_config(
        &fixture,
        "[brackets]\nupper_bounds = [750000, 1000000, 1250000, 2000000]\n",
    );

    let result = show_with_options(ConfigShowOptions {
        config_path: Some(&config),
    });
    assert!(result.is_ok());
    if let Ok(envelope) = result {
        assert_eq!(envelope.data["brackets"][0]["label"], "£0 - £750k");
        assert_eq!(envelope.data["brackets"][4]["label"], "£2m+");
        assert_eq!(envelope.data["batch_correction"], true);
    }
}
