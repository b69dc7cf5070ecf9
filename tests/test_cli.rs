//! End-to-end tests of the claimlens binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_missing_input_is_reported() {
    let mut cmd = Command::cargo_bin("claimlens").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Input file is required"));
}

#[test]
fn test_nonexistent_input_fails_cleanly() {
    let mut cmd = Command::cargo_bin("claimlens").unwrap();
    cmd.args(["--input", "/no/such/file.psv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn test_full_pipeline_run() {
    let mut df = common::sample_portfolio(80);
    let (_data_dir, input) = common::write_portfolio_file(&mut df);
    let out_dir = TempDir::new().unwrap();
    let cleaned = out_dir.path().join("cleaned.psv");

    let mut cmd = Command::cargo_bin("claimlens").unwrap();
    cmd.args([
        "--input",
        input.to_str().unwrap(),
        "--output-dir",
        out_dir.path().to_str().unwrap(),
        "--zip-a",
        "1000",
        "--zip-b",
        "2000",
        "--save-cleaned",
        cleaned.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Claim Frequency"))
    .stdout(predicate::str::contains("RUN SUMMARY"));

    assert!(cleaned.exists());
    assert!(out_dir.path().join("run_export.json").exists());
    assert!(out_dir.path().join("monthly_trends.png").exists());
    assert!(out_dir.path().join("attribution_summary.png").exists());

    let export: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.path().join("run_export.json")).unwrap())
            .unwrap();
    assert!(export["kpis"]["claim_frequency"].as_f64().unwrap() > 0.0);
    assert!(!export["tests"].as_array().unwrap().is_empty());
}

#[test]
fn test_no_plots_flag_skips_charts() {
    let mut df = common::sample_portfolio(60);
    let (_data_dir, input) = common::write_portfolio_file(&mut df);
    let out_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("claimlens").unwrap();
    cmd.args([
        "--input",
        input.to_str().unwrap(),
        "--output-dir",
        out_dir.path().to_str().unwrap(),
        "--no-plots",
    ])
    .assert()
    .success();

    assert!(!out_dir.path().join("monthly_trends.png").exists());
    assert!(out_dir.path().join("run_export.json").exists());
}
