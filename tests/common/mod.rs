//! Shared test fixtures: a small synthetic insurance portfolio

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use claimlens::pipeline::loader::SEPARATOR;

/// Deterministic synthetic portfolio covering the columns the pipeline
/// cares about: identifiers, dates, segments, vehicle fields, risk flags
/// with gaps, two near-empty columns, and the monetary pair.
///
/// Roughly one row in four carries a positive claim.
pub fn sample_portfolio(n: usize) -> DataFrame {
    let months = [
        "2015-01-01",
        "2015-02-01",
        "2015-03-01",
        "2015-04-01",
        "2015-05-01",
        "2015-06-01",
    ];
    let makes = ["Toyota", "Volkswagen", "BMW", "Ford"];
    let provinces = ["Gauteng", "Western Cape"];
    let genders = ["Male", "Female", "Not specified"];
    let postal_codes = ["1000", "2000", "3000"];

    let policy_id: Vec<i32> = (0..n as i32).collect();
    let month: Vec<&str> = (0..n).map(|i| months[i % months.len()]).collect();
    let province: Vec<&str> = (0..n).map(|i| provinces[i % provinces.len()]).collect();
    let postal: Vec<&str> = (0..n).map(|i| postal_codes[i % postal_codes.len()]).collect();
    let gender: Vec<&str> = (0..n).map(|i| genders[i % genders.len()]).collect();
    let vehicle_type: Vec<&str> = (0..n)
        .map(|i| if i % 2 == 0 { "Passenger Vehicle" } else { "Light Commercial" })
        .collect();
    let make: Vec<&str> = (0..n).map(|i| makes[i % makes.len()]).collect();
    let registration_year: Vec<i32> = (0..n).map(|i| 2000 + (i as i32 % 12)).collect();
    let intro_date: Vec<&str> = (0..n)
        .map(|i| if i % 2 == 0 { "2008-06-01" } else { "2011-03-01" })
        .collect();
    let statutory: Vec<&str> = (0..n)
        .map(|i| if i % 2 == 0 { "Personal" } else { "Commercial" })
        .collect();

    let custom_value: Vec<Option<f64>> = (0..n)
        .map(|i| {
            if i % 5 == 0 {
                None
            } else {
                Some(50_000.0 + (i as f64 % 7.0) * 10_000.0)
            }
        })
        .collect();
    // One deliberately malformed numeric value to exercise silent coercion.
    let capital: Vec<String> = (0..n)
        .map(|i| {
            if i == 7 {
                "not-a-number".to_string()
            } else {
                format!("{:.1}", 1_000.0 + i as f64 * 13.0)
            }
        })
        .collect();

    let written_off: Vec<Option<&str>> = (0..n)
        .map(|i| if i % 9 == 0 { Some("Yes") } else { None })
        .collect();
    let rebuilt: Vec<Option<&str>> = (0..n)
        .map(|i| if i % 11 == 0 { Some("Yes") } else { None })
        .collect();
    let converted: Vec<Option<&str>> = vec![None; n];

    let sum_insured: Vec<f64> = (0..n).map(|i| 80_000.0 + (i as f64 % 5.0) * 20_000.0).collect();
    let premium: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 % 7.0) * 25.0).collect();
    let claims: Vec<f64> = (0..n)
        .map(|i| if i % 4 == 0 { 500.0 + i as f64 * 10.0 } else { 0.0 })
        .collect();

    df! {
        "PolicyID" => policy_id,
        "TransactionMonth" => month,
        "Province" => province,
        "PostalCode" => postal,
        "Gender" => gender,
        "VehicleType" => vehicle_type,
        "make" => make,
        "RegistrationYear" => registration_year,
        "VehicleIntroDate" => intro_date,
        "StatutoryRiskType" => statutory,
        "CustomValueEstimate" => custom_value,
        "CapitalOutstanding" => capital,
        "WrittenOff" => written_off,
        "Rebuilt" => rebuilt,
        "Converted" => converted,
        "CrossBorder" => vec![None::<&str>; n],
        "NumberOfVehiclesInFleet" => vec![None::<f64>; n],
        "SumInsured" => sum_insured,
        "TotalPremium" => premium,
        "TotalClaims" => claims,
    }
    .unwrap()
}

/// Write a frame as a pipe-delimited file in a fresh temp directory.
pub fn write_portfolio_file(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("portfolio.psv");

    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file)
        .with_separator(SEPARATOR)
        .finish(df)
        .unwrap();

    (dir, path)
}
