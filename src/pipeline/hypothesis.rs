//! Risk-segment KPIs and hypothesis tests
//!
//! `HypothesisTester` holds a working copy of the portfolio and derives the
//! claim KPIs; the tests themselves live on [`MetricsReady`], the state
//! returned by [`HypothesisTester::calculate_metrics`]. Running a test
//! before the KPI columns exist is therefore not expressible.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::stats::{chi_square_from_table, welch_t_test};
use crate::error::ClaimlensError;

/// Significance threshold shared by every test.
const ALPHA: f64 = 0.05;

/// Portfolio-level claim KPIs.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    /// Fraction of policies with at least one nonzero claim.
    pub claim_frequency: f64,
    /// Mean claim amount among policies that claimed (zero when none did).
    pub claim_severity: f64,
    /// Mean of premium minus claims.
    pub average_margin: f64,
}

/// A single test result with its mechanical interpretation.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub test: String,
    pub feature: String,
    pub statistic: f64,
    pub p_value: f64,
    pub reject_null: bool,
    /// Group labels and their means, for two-sample tests.
    pub groups: Option<(String, String)>,
    pub group_means: Option<(f64, f64)>,
    pub interpretation: String,
}

/// Tester state before the KPI columns exist.
#[derive(Debug)]
pub struct HypothesisTester {
    data: DataFrame,
}

/// Tester state once `ClaimOccurred` and `Margin` have been derived.
#[derive(Debug)]
pub struct MetricsReady {
    data: DataFrame,
    metrics: KpiSummary,
}

impl HypothesisTester {
    /// Take a working copy of the portfolio.
    pub fn new(data: DataFrame) -> Self {
        Self { data }
    }

    /// Derive the claim-occurred indicator and margin columns, returning
    /// the ready state that the tests are defined on.
    pub fn calculate_metrics(self) -> Result<MetricsReady> {
        let data = self
            .data
            .lazy()
            .with_columns([
                col("TotalClaims")
                    .gt(lit(0.0))
                    .cast(DataType::Int32)
                    .alias("ClaimOccurred"),
                (col("TotalPremium") - col("TotalClaims")).alias("Margin"),
            ])
            .collect()
            .context("deriving KPI columns")?;

        let occurred = data.column("ClaimOccurred")?.cast(&DataType::Float64)?;
        let claim_frequency = occurred.f64()?.mean().unwrap_or(0.0);

        let claimed = data
            .clone()
            .lazy()
            .filter(col("ClaimOccurred").eq(lit(1)))
            .collect()?;
        let claim_severity = if claimed.height() > 0 {
            claimed
                .column("TotalClaims")?
                .cast(&DataType::Float64)?
                .f64()?
                .mean()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let average_margin = data
            .column("Margin")?
            .cast(&DataType::Float64)?
            .f64()?
            .mean()
            .unwrap_or(0.0);

        Ok(MetricsReady {
            data,
            metrics: KpiSummary {
                claim_frequency,
                claim_severity,
                average_margin,
            },
        })
    }
}

impl MetricsReady {
    pub fn metrics(&self) -> &KpiSummary {
        &self.metrics
    }

    /// Chi-square independence of Province vs claim occurrence.
    pub fn test_province_risk(&self) -> Result<TestOutcome> {
        chi_square_on(&self.data, "Province")
    }

    /// Chi-square on claim occurrence, restricted to two postal codes.
    pub fn test_zipcode_risk(&self, zip_a: &str, zip_b: &str) -> Result<TestOutcome> {
        let subset = filter_values(&self.data, "PostalCode", &[zip_a, zip_b])?;
        chi_square_on(&subset, "PostalCode")
    }

    /// Welch t-test on margin between two postal codes.
    pub fn test_zipcode_margin(&self, zip_a: &str, zip_b: &str) -> Result<TestOutcome> {
        let subset = filter_values(&self.data, "PostalCode", &[zip_a, zip_b])?;
        t_test_on(&subset, "PostalCode", "Margin")
    }

    /// Chi-square on claim occurrence and t-test on claim amount, both
    /// restricted to the Male/Female categories.
    pub fn test_gender_risk(&self) -> Result<(TestOutcome, TestOutcome)> {
        let subset = filter_values(&self.data, "Gender", &["Male", "Female"])?;
        let frequency = chi_square_on(&subset, "Gender")?;
        let severity = t_test_on(&subset, "Gender", "TotalClaims")?;
        Ok((frequency, severity))
    }
}

/// Restrict the frame to rows whose column takes one of the given values.
fn filter_values(df: &DataFrame, column: &str, values: &[&str]) -> Result<DataFrame> {
    let keep = Series::new(
        "keep".into(),
        values.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
    );
    Ok(df
        .clone()
        .lazy()
        .filter(col(column).cast(DataType::String).is_in(lit(keep)))
        .collect()?)
}

fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let col = df
        .column(column)
        .with_context(|| format!("column '{column}' not found"))?
        .cast(&DataType::String)?;
    Ok(col
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Chi-square independence between a categorical feature and the
/// claim-occurred indicator.
pub fn chi_square_on(df: &DataFrame, feature: &str) -> Result<TestOutcome> {
    let labels = string_values(df, feature)?;
    let occurred: Vec<Option<i32>> = df
        .column("ClaimOccurred")?
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .collect();

    // Contingency counts keyed by category, columns = occurred {0, 1}.
    let mut counts: BTreeMap<String, [f64; 2]> = BTreeMap::new();
    for (label, flag) in labels.into_iter().zip(occurred.into_iter()) {
        if let (Some(label), Some(flag)) = (label, flag) {
            let entry = counts.entry(label).or_insert([0.0, 0.0]);
            entry[(flag != 0) as usize] += 1.0;
        }
    }

    let table: Vec<Vec<f64>> = counts.values().map(|row| row.to_vec()).collect();
    let non_empty_rows = table
        .iter()
        .filter(|row| row.iter().sum::<f64>() > 0.0)
        .count();
    let non_empty_cols = (0..2)
        .filter(|&j| table.iter().map(|row| row[j]).sum::<f64>() > 0.0)
        .count();
    if non_empty_rows < 2 || non_empty_cols < 2 {
        return Err(ClaimlensError::DegenerateTable {
            feature: feature.to_string(),
        }
        .into());
    }

    let result = chi_square_from_table(&table)?;
    Ok(interpret(TestOutcome {
        test: "Chi-Square (Claim Frequency)".to_string(),
        feature: feature.to_string(),
        statistic: result.statistic,
        p_value: result.p_value,
        reject_null: result.p_value < ALPHA,
        groups: None,
        group_means: None,
        interpretation: String::new(),
    }))
}

/// Welch t-test of a value column between the exactly-two groups of a
/// feature column.
pub fn t_test_on(df: &DataFrame, feature: &str, value_col: &str) -> Result<TestOutcome> {
    let labels = string_values(df, feature)?;
    let values: Vec<Option<f64>> = df
        .column(value_col)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect();

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (label, value) in labels.into_iter().zip(values.into_iter()) {
        if let Some(label) = label {
            groups.entry(label).or_default().extend(value);
        }
    }

    if groups.len() != 2 {
        return Err(ClaimlensError::GroupCount {
            feature: feature.to_string(),
            count: groups.len(),
        }
        .into());
    }

    let mut iter = groups.into_iter();
    let (name_a, values_a) = iter.next().expect("two groups");
    let (name_b, values_b) = iter.next().expect("two groups");

    let result = welch_t_test(&values_a, &values_b)?;
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;

    Ok(interpret(TestOutcome {
        test: format!("T-Test ({value_col})"),
        feature: feature.to_string(),
        statistic: result.statistic,
        p_value: result.p_value,
        reject_null: result.p_value < ALPHA,
        groups: Some((name_a.clone(), name_b.clone())),
        group_means: Some((mean(&values_a), mean(&values_b))),
        interpretation: String::new(),
    }))
}

/// Fill the natural-language interpretation from the p-value.
fn interpret(mut outcome: TestOutcome) -> TestOutcome {
    outcome.interpretation = if outcome.reject_null {
        format!(
            "Reject the null hypothesis for {} (p={:.4}): statistically significant difference.",
            outcome.feature, outcome.p_value
        )
    } else {
        format!(
            "Fail to reject the null hypothesis for {} (p={:.4}): no evidence of difference.",
            outcome.feature, outcome.p_value
        )
    };
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_scenario() {
        let df = df! {
            "TotalPremium" => [100.0f64, 200.0],
            "TotalClaims" => [0.0f64, 50.0],
        }
        .unwrap();

        let ready = HypothesisTester::new(df).calculate_metrics().unwrap();
        let kpis = ready.metrics();
        assert!((kpis.claim_frequency - 0.5).abs() < 1e-12);
        assert!((kpis.claim_severity - 50.0).abs() < 1e-12);
        assert!((kpis.average_margin - 75.0).abs() < 1e-12);
    }

    #[test]
    fn test_severity_zero_when_no_claims() {
        let df = df! {
            "TotalPremium" => [100.0f64, 200.0],
            "TotalClaims" => [0.0f64, 0.0],
        }
        .unwrap();

        let ready = HypothesisTester::new(df).calculate_metrics().unwrap();
        assert_eq!(ready.metrics().claim_severity, 0.0);
        assert_eq!(ready.metrics().claim_frequency, 0.0);
    }

    fn province_fixture() -> DataFrame {
        let n = 40;
        let provinces: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "A" } else { "B" }).collect();
        // Province A claims in 18 of 20 rows, B in 2 of 20: strongly dependent.
        let claims: Vec<f64> = (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    if i < 36 { 100.0 } else { 0.0 }
                } else if i < 4 {
                    100.0
                } else {
                    0.0
                }
            })
            .collect();
        df! {
            "Province" => provinces,
            "TotalPremium" => vec![200.0f64; n],
            "TotalClaims" => claims,
        }
        .unwrap()
    }

    #[test]
    fn test_province_risk_detects_dependence() {
        let ready = HypothesisTester::new(province_fixture())
            .calculate_metrics()
            .unwrap();
        let outcome = ready.test_province_risk().unwrap();
        assert!(outcome.reject_null, "p={} too large", outcome.p_value);
        assert!(outcome.interpretation.contains("Reject the null hypothesis"));
    }

    #[test]
    fn test_zipcode_margin_requires_two_groups() {
        let df = df! {
            "PostalCode" => ["1000", "1000", "2000", "2000", "3000"],
            "TotalPremium" => [100.0f64, 110.0, 90.0, 95.0, 80.0],
            "TotalClaims" => [0.0f64, 10.0, 0.0, 5.0, 0.0],
        }
        .unwrap();

        let ready = HypothesisTester::new(df).calculate_metrics().unwrap();
        // Filtering to one existing and one absent code leaves one group.
        let err = ready.test_zipcode_margin("1000", "9999").unwrap_err();
        match err.downcast_ref::<ClaimlensError>() {
            Some(ClaimlensError::GroupCount { feature, count }) => {
                assert_eq!(feature, "PostalCode");
                assert_eq!(*count, 1);
            }
            other => panic!("expected GroupCount, got {other:?}"),
        }
    }

    #[test]
    fn test_gender_risk_returns_both_outcomes() {
        let n = 30;
        let genders: Vec<&str> = (0..n)
            .map(|i| match i % 3 {
                0 => "Male",
                1 => "Female",
                _ => "Not specified",
            })
            .collect();
        let claims: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 120.0 } else { 0.0 }).collect();
        let df = df! {
            "Gender" => genders,
            "TotalPremium" => vec![150.0f64; n],
            "TotalClaims" => claims,
        }
        .unwrap();

        let ready = HypothesisTester::new(df).calculate_metrics().unwrap();
        let (frequency, severity) = ready.test_gender_risk().unwrap();
        assert_eq!(frequency.feature, "Gender");
        assert_eq!(severity.test, "T-Test (TotalClaims)");
        let (a, b) = severity.groups.unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("Female", "Male"));
    }
}
