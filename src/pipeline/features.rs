//! Feature engineering and train/test preparation
//!
//! Builds the modeling view of the portfolio: binary claim label, vehicle
//! age, one-hot encoded categoricals, and the stratified frequency/severity
//! splits consumed by the trainer.

use anyhow::{Context, Result};
use ndarray::{Array2, Axis};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ClaimlensError;

/// Registration-year baseline when no usable transaction date exists.
const FALLBACK_YEAR: i32 = 2015;

/// Seed for the stratified split.
const SPLIT_SEED: u64 = 42;

/// Raw date columns dropped once derived features exist.
const DATE_COLS: [&str; 2] = ["TransactionMonth", "VehicleIntroDate"];

/// A dense feature matrix with its ordered column names.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// New matrix holding the given rows, in order.
    pub fn take_rows(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            names: self.names.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }

    /// Per-column means, used as the background for attribution.
    pub fn column_means(&self) -> Vec<f64> {
        (0..self.n_cols())
            .map(|j| {
                let col = self.values.index_axis(Axis(1), j);
                col.sum() / self.n_rows().max(1) as f64
            })
            .collect()
    }
}

/// The eight artifacts of `prepare_modeling_data`.
#[derive(Debug)]
pub struct ModelingData {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_freq_train: Vec<f64>,
    pub y_freq_test: Vec<f64>,
    pub x_sev_train: FeatureMatrix,
    pub x_sev_test: FeatureMatrix,
    pub y_sev_train: Vec<f64>,
    pub y_sev_test: Vec<f64>,
}

/// Owns a working copy of the cleaned portfolio and derives modeling
/// features from it.
#[derive(Debug)]
pub struct FeatureEngineer {
    data: DataFrame,
    engineered: bool,
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

impl FeatureEngineer {
    pub fn new(data: DataFrame) -> Self {
        Self {
            data,
            engineered: false,
        }
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Add the claim label and vehicle age, drop the raw date columns, and
    /// one-hot encode every categorical/text column (first category
    /// dropped so encoded train/test column sets always agree).
    pub fn create_features(&mut self) -> Result<DataFrame> {
        let mut df = self.data.clone();

        let mut exprs: Vec<Expr> = Vec::new();
        if has_column(&df, "TotalClaims") {
            exprs.push(
                col("TotalClaims")
                    .gt(lit(0.0))
                    .cast(DataType::Int32)
                    .alias("HasClaim"),
            );
        }
        if has_column(&df, "RegistrationYear") {
            let current_year = latest_transaction_year(&df).unwrap_or(FALLBACK_YEAR);
            exprs.push(
                (lit(current_year) - col("RegistrationYear").cast(DataType::Int32))
                    .alias("VehicleAge"),
            );
        }
        df = df.lazy().with_columns(exprs).collect()?;

        let date_drops: Vec<String> = DATE_COLS
            .iter()
            .filter(|name| has_column(&df, name))
            .map(|name| name.to_string())
            .collect();
        df = df.drop_many(date_drops);

        // Booleans go through String so they encode like any other category.
        let bool_casts: Vec<Expr> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::Boolean)
            .map(|c| col(c.name().as_str()).cast(DataType::String))
            .collect();
        df = df.lazy().with_columns(bool_casts).collect()?;

        let categorical: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype().is_categorical() || c.dtype() == &DataType::String)
            .map(|c| c.name().to_string())
            .collect();

        if !categorical.is_empty() {
            let names: Vec<&str> = categorical.iter().map(|s| s.as_str()).collect();
            df = df
                .columns_to_dummies(names, None, true)
                .context("one-hot encoding categorical columns")?;
        }

        self.data = df.clone();
        self.engineered = true;
        Ok(df)
    }

    /// Stratified train/test split on the claim label plus the
    /// positive-claim severity subsets of each partition.
    pub fn prepare_modeling_data(&self, test_size: f64) -> Result<ModelingData> {
        if !self.engineered {
            return Err(ClaimlensError::InvalidState(
                "create features before preparing modeling data".to_string(),
            )
            .into());
        }
        if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
            anyhow::bail!("test_size must be between 0 and 1, got {test_size}");
        }

        let df = &self.data;
        let y_freq: Vec<f64> = df
            .column("HasClaim")
            .context("HasClaim label column missing")?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        let y_sev: Vec<f64> = df
            .column("TotalClaims")
            .context("TotalClaims column missing")?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();

        let features = df.drop_many(["HasClaim".to_string(), "TotalClaims".to_string()]);
        let matrix = build_matrix(&features)?;

        let (train_idx, test_idx) = stratified_split(&y_freq, test_size, SPLIT_SEED);

        let take = |idx: &[usize], v: &[f64]| idx.iter().map(|&i| v[i]).collect::<Vec<f64>>();
        let positive = |idx: &[usize]| {
            idx.iter()
                .copied()
                .filter(|&i| y_sev[i] > 0.0)
                .collect::<Vec<usize>>()
        };

        let sev_train_idx = positive(&train_idx);
        let sev_test_idx = positive(&test_idx);

        Ok(ModelingData {
            x_train: matrix.take_rows(&train_idx),
            x_test: matrix.take_rows(&test_idx),
            y_freq_train: take(&train_idx, &y_freq),
            y_freq_test: take(&test_idx, &y_freq),
            x_sev_train: matrix.take_rows(&sev_train_idx),
            x_sev_test: matrix.take_rows(&sev_test_idx),
            y_sev_train: take(&sev_train_idx, &y_sev),
            y_sev_test: take(&sev_test_idx, &y_sev),
        })
    }
}

/// Year of the latest transaction, when a date-typed column exists.
fn latest_transaction_year(df: &DataFrame) -> Option<i32> {
    if !has_column(df, "TransactionMonth") {
        return None;
    }
    let dtype = df.column("TransactionMonth").ok()?.dtype().clone();
    if !matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        return None;
    }
    let years = df
        .clone()
        .lazy()
        .select([col("TransactionMonth").dt().year().max().alias("year")])
        .collect()
        .ok()?;
    years.column("year").ok()?.cast(&DataType::Int32).ok()?.i32().ok()?.get(0)
}

/// Dense f64 matrix from an all-numeric frame; remaining nulls are filled
/// with the column mean so every entry is finite.
fn build_matrix(df: &DataFrame) -> Result<FeatureMatrix> {
    let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
    let mut values = Array2::<f64>::zeros((df.height(), names.len()));

    for (j, name) in names.iter().enumerate() {
        let casted = df
            .column(name)?
            .cast(&DataType::Float64)
            .with_context(|| format!("column '{name}' is not numeric after encoding"))?;
        let ca = casted.f64()?;

        let observed: Vec<f64> = ca.into_iter().flatten().collect();
        let mean = if observed.is_empty() {
            0.0
        } else {
            observed.iter().sum::<f64>() / observed.len() as f64
        };

        for (i, v) in ca.into_iter().enumerate() {
            values[[i, j]] = v.unwrap_or(mean);
        }
    }

    Ok(FeatureMatrix { names, values })
}

/// Seeded stratified split preserving original row indices.
fn stratified_split(labels: &[f64], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    let mut classes: Vec<f64> = Vec::new();
    for &label in labels {
        if !classes.iter().any(|&c| c == label) {
            classes.push(label);
        }
    }
    classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    for class in classes {
        let mut indices: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        indices.shuffle(&mut rng);

        let mut n_test = (indices.len() as f64 * test_size).round() as usize;
        if indices.len() > 1 {
            n_test = n_test.clamp(1, indices.len() - 1);
        }
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
