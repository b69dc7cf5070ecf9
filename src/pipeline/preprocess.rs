//! Type coercion, missing-value reporting, and cleaning rules

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

/// Date-typed columns in the portfolio extract.
const DATE_COLS: [&str; 2] = ["TransactionMonth", "VehicleIntroDate"];

/// Columns dropped by `handle_missing` (missing in nearly every row).
const NEAR_EMPTY_COLS: [&str; 2] = ["NumberOfVehiclesInFleet", "CrossBorder"];

/// Vehicle risk flags whose nulls mean "No".
const RISK_FLAG_COLS: [&str; 3] = ["WrittenOff", "Rebuilt", "Converted"];

/// Columns converted to categorical when present as text.
const CATEGORICAL_COLS: [&str; 31] = [
    "IsVATRegistered",
    "Citizenship",
    "LegalType",
    "Title",
    "Language",
    "Bank",
    "AccountType",
    "MaritalStatus",
    "Gender",
    "Country",
    "Province",
    "MainCrestaZone",
    "SubCrestaZone",
    "ItemType",
    "VehicleType",
    "make",
    "Model",
    "bodytype",
    "AlarmImmobiliser",
    "TrackingDevice",
    "TermFrequency",
    "CoverCategory",
    "CoverType",
    "CoverGroup",
    "Section",
    "Product",
    "StatutoryClass",
    "StatutoryRiskType",
    "WrittenOff",
    "Rebuilt",
    "Converted",
];

/// Cleaning options beyond the fixed drop/fill rules.
#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    /// Treat a zero `CustomValueEstimate` as missing. Off by default; zero
    /// is a legitimate placeholder in some source systems.
    pub remap_zero_custom_value: bool,
}

/// One row of the missing-value report.
#[derive(Debug, Clone, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Coerce the portfolio's known columns to their working dtypes.
///
/// Unparseable numeric values become null rather than failing the call, and
/// every coercion is guarded on column presence so partial extracts convert
/// cleanly.
pub fn convert_types(df: &DataFrame) -> Result<DataFrame> {
    let mut exprs: Vec<Expr> = Vec::new();

    if has_column(df, "PostalCode") {
        exprs.push(col("PostalCode").cast(DataType::String));
    }

    for name in DATE_COLS {
        if has_column(df, name) && df.column(name)?.dtype() == &DataType::String {
            exprs.push(
                col(name).str().to_date(StrptimeOptions {
                    format: None,
                    strict: false,
                    exact: false,
                    cache: true,
                }),
            );
        }
    }

    if has_column(df, "CapitalOutstanding") {
        exprs.push(col("CapitalOutstanding").cast(DataType::Float64));
    }

    let converted = df.clone().lazy().with_columns(exprs).collect()?;

    // Categorical conversion runs second so PostalCode is already a string
    // and can be treated as a category alongside the fixed list.
    let mut cat_exprs: Vec<Expr> = Vec::new();
    let mut cat_cols: Vec<&str> = CATEGORICAL_COLS.to_vec();
    cat_cols.push("PostalCode");
    for name in cat_cols {
        if has_column(&converted, name)
            && converted.column(name)?.dtype() == &DataType::String
        {
            cat_exprs.push(col(name).cast(DataType::Categorical(None, Default::default())));
        }
    }

    Ok(converted.lazy().with_columns(cat_exprs).collect()?)
}

/// Count and percentage of nulls per column, highest percentage first.
///
/// Columns without missing values are omitted.
pub fn missing_report(df: &DataFrame) -> Vec<MissingEntry> {
    let height = df.height();
    if height == 0 {
        return Vec::new();
    }

    let mut entries: Vec<MissingEntry> = df
        .get_columns()
        .iter()
        .filter_map(|column| {
            let count = column.null_count();
            if count == 0 {
                return None;
            }
            Some(MissingEntry {
                column: column.name().to_string(),
                count,
                percent: count as f64 / height as f64 * 100.0,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    entries
}

/// Apply the portfolio's cleaning policy.
///
/// Drops the two near-entirely-missing columns when present and fills the
/// vehicle risk flags with the `"No"` sentinel. All other missingness is
/// left for downstream stages to decide on.
pub fn handle_missing(df: &DataFrame, config: &CleanConfig) -> Result<DataFrame> {
    let present_drops: Vec<String> = NEAR_EMPTY_COLS
        .iter()
        .filter(|name| has_column(df, name))
        .map(|name| name.to_string())
        .collect();

    let mut cleaned = df.drop_many(present_drops);

    if config.remap_zero_custom_value && has_column(&cleaned, "CustomValueEstimate") {
        cleaned = cleaned
            .lazy()
            .with_column(
                when(col("CustomValueEstimate").eq(lit(0.0)))
                    .then(lit(NULL))
                    .otherwise(col("CustomValueEstimate"))
                    .alias("CustomValueEstimate"),
            )
            .collect()?;
    }

    let fill_exprs: Vec<Expr> = RISK_FLAG_COLS
        .iter()
        .filter(|name| has_column(&cleaned, name))
        .map(|name| {
            // Round-trip through String: filling a categorical with a value
            // outside its dictionary is not allowed.
            col(*name)
                .cast(DataType::String)
                .fill_null(lit("No"))
                .cast(DataType::Categorical(None, Default::default()))
        })
        .collect();

    Ok(cleaned.lazy().with_columns(fill_exprs).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_types_silently_nulls_bad_numerics() {
        let df = df! {
            "CapitalOutstanding" => ["1000.5", "not-a-number", "250"],
        }
        .unwrap();

        let converted = convert_types(&df).unwrap();
        let col = converted.column("CapitalOutstanding").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_convert_types_skips_absent_columns() {
        let df = df! {
            "Province" => ["Gauteng", "Western Cape"],
        }
        .unwrap();

        let converted = convert_types(&df).unwrap();
        assert!(converted.column("Province").unwrap().dtype().is_categorical());
    }

    #[test]
    fn test_missing_report_sorted_descending() {
        let df = df! {
            "a" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
            "b" => [None::<f64>, None, None, Some(4.0)],
            "c" => [1.0f64, 2.0, 3.0, 4.0],
        }
        .unwrap();

        let report = missing_report(&df);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].column, "b");
        assert_eq!(report[0].count, 3);
        assert!((report[0].percent - 75.0).abs() < 1e-9);
        assert_eq!(report[1].column, "a");
    }

    #[test]
    fn test_handle_missing_drops_and_fills() {
        let df = df! {
            "NumberOfVehiclesInFleet" => [None::<f64>, None, None],
            "WrittenOff" => [Some("Yes"), None, None],
            "TotalClaims" => [0.0f64, 10.0, 0.0],
        }
        .unwrap();

        let cleaned = handle_missing(&df, &CleanConfig::default()).unwrap();
        assert!(!has_column(&cleaned, "NumberOfVehiclesInFleet"));

        let flags = cleaned.column("WrittenOff").unwrap();
        assert_eq!(flags.null_count(), 0);
    }

    #[test]
    fn test_zero_remap_is_off_by_default() {
        let df = df! {
            "CustomValueEstimate" => [0.0f64, 150000.0],
        }
        .unwrap();

        let default_clean = handle_missing(&df, &CleanConfig::default()).unwrap();
        assert_eq!(default_clean.column("CustomValueEstimate").unwrap().null_count(), 0);

        let config = CleanConfig {
            remap_zero_custom_value: true,
        };
        let remapped = handle_missing(&df, &config).unwrap();
        assert_eq!(remapped.column("CustomValueEstimate").unwrap().null_count(), 1);
    }
}
