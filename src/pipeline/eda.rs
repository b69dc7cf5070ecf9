//! Descriptive statistics, loss-ratio aggregation, and bivariate summaries

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::stats::spearman_correlation;

/// Number of most-frequent postal codes examined for monthly correlation.
const TOP_ZIP_COUNT: usize = 5;

/// Standard summary statistics for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Variability view: central tendency plus coefficient of variation.
#[derive(Debug, Clone, Serialize)]
pub struct VariabilityRow {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub cv: f64,
}

/// Per-category premium/claims breakdown for one segment column.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentRow {
    pub category: String,
    pub premium: f64,
    pub claims: f64,
    pub loss_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentBreakdown {
    pub column: String,
    pub rows: Vec<SegmentRow>,
}

/// Overall loss ratio plus per-segment breakdowns.
#[derive(Debug, Clone, Serialize)]
pub struct LossRatioReport {
    pub overall: f64,
    pub segments: Vec<SegmentBreakdown>,
}

/// One month of portfolio totals.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub premium: f64,
    pub claims: f64,
    pub loss_ratio: f64,
}

/// Trend and correlation-focused summaries.
#[derive(Debug, Clone, Serialize)]
pub struct BivariateSummary {
    pub monthly: Vec<MonthlyPoint>,
    /// Mean claim amount per vehicle make among rows with a payout,
    /// highest severity first.
    pub make_severity: Vec<(String, f64)>,
    /// Spearman correlation of monthly premium vs claim totals for the
    /// most frequent postal codes. Codes with fewer than two monthly
    /// observations are omitted.
    pub zip_correlations: Vec<(String, f64)>,
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .with_context(|| format!("column '{name}' not found"))?
        .cast(&DataType::Float64)?;
    Ok(col.f64()?.into_iter().flatten().collect())
}

fn column_sum(df: &DataFrame, name: &str) -> Result<f64> {
    Ok(numeric_values(df, name)?.iter().sum())
}

/// Linear-interpolated quantile of an ascending-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Standard summary table plus a variability table for the given numeric
/// columns. Absent columns are skipped.
pub fn descriptive_statistics(
    df: &DataFrame,
    cols: &[&str],
) -> Result<(Vec<ColumnSummary>, Vec<VariabilityRow>)> {
    let mut summaries = Vec::new();
    let mut variability = Vec::new();

    for &name in cols {
        if !has_column(df, name) {
            continue;
        }
        let mut values = numeric_values(df, name)?;
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = values.len();
        if count == 0 {
            continue;
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
                / (count as f64 - 1.0))
                .sqrt()
        } else {
            0.0
        };
        let median = quantile(&values, 0.5);

        summaries.push(ColumnSummary {
            column: name.to_string(),
            count,
            mean,
            std,
            min: values[0],
            q25: quantile(&values, 0.25),
            median,
            q75: quantile(&values, 0.75),
            max: values[count - 1],
        });
        variability.push(VariabilityRow {
            column: name.to_string(),
            mean,
            median,
            std,
            cv: std / mean,
        });
    }

    Ok((summaries, variability))
}

/// Overall claims/premium ratio plus per-category breakdowns for each
/// requested segment column that is present in the data.
pub fn loss_ratios(df: &DataFrame, segment_cols: &[&str]) -> Result<LossRatioReport> {
    let overall = column_sum(df, "TotalClaims")? / column_sum(df, "TotalPremium")?;

    let mut segments = Vec::new();
    for &segment in segment_cols {
        if !has_column(df, segment) {
            continue;
        }

        let grouped = df
            .clone()
            .lazy()
            .group_by([col(segment).cast(DataType::String)])
            .agg([
                col("TotalPremium").sum().alias("premium"),
                col("TotalClaims").sum().alias("claims"),
            ])
            .collect()?;

        let categories = grouped.column(segment)?.str()?.clone();
        let premiums = grouped.column("premium")?.cast(&DataType::Float64)?;
        let claims = grouped.column("claims")?.cast(&DataType::Float64)?;

        let mut rows: Vec<SegmentRow> = categories
            .into_iter()
            .zip(premiums.f64()?.into_iter())
            .zip(claims.f64()?.into_iter())
            .filter_map(|((category, premium), claim)| {
                let category = category?;
                let premium = premium.unwrap_or(0.0);
                let claim = claim.unwrap_or(0.0);
                Some(SegmentRow {
                    category: category.to_string(),
                    premium,
                    claims: claim,
                    loss_ratio: claim / premium,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.loss_ratio
                .partial_cmp(&a.loss_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        segments.push(SegmentBreakdown {
            column: segment.to_string(),
            rows,
        });
    }

    Ok(LossRatioReport { overall, segments })
}

/// Monthly premium/claim totals for whichever frame is passed in,
/// chronologically sorted.
fn monthly_totals(df: &DataFrame) -> Result<Vec<MonthlyPoint>> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col("TransactionMonth")])
        .agg([
            col("TotalPremium").sum().alias("premium"),
            col("TotalClaims").sum().alias("claims"),
        ])
        .sort(["TransactionMonth"], SortMultipleOptions::default())
        .collect()?;

    let months = grouped.column("TransactionMonth")?.cast(&DataType::String)?;
    let premiums = grouped.column("premium")?.cast(&DataType::Float64)?;
    let claims = grouped.column("claims")?.cast(&DataType::Float64)?;

    let points = months
        .str()?
        .into_iter()
        .zip(premiums.f64()?.into_iter())
        .zip(claims.f64()?.into_iter())
        .filter_map(|((month, premium), claim)| {
            let month = month?;
            let premium = premium.unwrap_or(0.0);
            let claim = claim.unwrap_or(0.0);
            Some(MonthlyPoint {
                month: month.to_string(),
                premium,
                claims: claim,
                loss_ratio: claim / premium,
            })
        })
        .collect();

    Ok(points)
}

/// The most frequent values of a column, descending by row count.
fn top_categories(df: &DataFrame, name: &str, n: usize) -> Result<Vec<String>> {
    let counted = df
        .clone()
        .lazy()
        .filter(col(name).is_not_null())
        .group_by([col(name).cast(DataType::String)])
        .agg([len().alias("n")])
        .sort(
            ["n"],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .limit(n as u32)
        .collect()?;

    Ok(counted
        .column(name)?
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect())
}

/// Monthly trend series, per-make claim severity, and premium-vs-claims
/// correlation in the most frequent postal codes.
pub fn bivariate_summary(df: &DataFrame) -> Result<BivariateSummary> {
    let has_months = has_column(df, "TransactionMonth");
    let monthly = if has_months {
        monthly_totals(df)?
    } else {
        Vec::new()
    };

    // Claim severity per make, restricted to rows with a payout.
    let with_claims = df
        .clone()
        .lazy()
        .filter(col("TotalClaims").gt(lit(0.0)))
        .collect()?;
    let mut make_severity: Vec<(String, f64)> = Vec::new();
    if has_column(df, "make") && with_claims.height() > 0 {
        let grouped = with_claims
            .lazy()
            .group_by([col("make").cast(DataType::String)])
            .agg([col("TotalClaims").mean().alias("severity")])
            .collect()?;
        let makes = grouped.column("make")?.str()?.clone();
        let severities = grouped.column("severity")?.cast(&DataType::Float64)?;
        make_severity = makes
            .into_iter()
            .zip(severities.f64()?.into_iter())
            .filter_map(|(make, severity)| Some((make?.to_string(), severity?)))
            .collect();
        make_severity.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    // Premium/claims co-movement in the densest postal codes.
    let mut zip_correlations = Vec::new();
    if has_months && has_column(df, "PostalCode") {
        for zip in top_categories(df, "PostalCode", TOP_ZIP_COUNT)? {
            let zip_rows = df
                .clone()
                .lazy()
                .filter(
                    col("PostalCode")
                        .cast(DataType::String)
                        .eq(lit(zip.as_str())),
                )
                .collect()?;
            let series = monthly_totals(&zip_rows)?;
            if series.len() < 2 {
                continue;
            }
            let premiums: Vec<f64> = series.iter().map(|p| p.premium).collect();
            let claims: Vec<f64> = series.iter().map(|p| p.claims).collect();
            if let Some(rho) = spearman_correlation(&premiums, &claims) {
                zip_correlations.push((zip, rho));
            }
        }
    }

    Ok(BivariateSummary {
        monthly,
        make_severity,
        zip_correlations,
    })
}
