//! Per-feature attribution of model predictions
//!
//! The explainer strategy is selected by the model's family tag: decision
//! path attribution for tree ensembles, coefficient-times-deviation for
//! the linear family (on the log-odds scale for classifiers, so the
//! positive class is what gets explained), and mean-substitution occlusion
//! as the fallback for opaque predictors.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use ndarray::Array2;

use super::{FittedModel, ModelFamily};
use crate::pipeline::features::FeatureMatrix;
use crate::plot;

/// Ranked attribution table plus the raw per-row values it was reduced
/// from.
#[derive(Debug)]
pub struct AttributionSummary {
    /// Which strategy produced the values.
    pub strategy: &'static str,
    /// Top features by mean absolute attribution, descending.
    pub table: Vec<(String, f64)>,
    /// Per-row, per-feature attribution values (all features).
    pub values: Array2<f64>,
}

/// Explains a fitted model over a held-out feature matrix.
pub struct FeatureInterpreter<'a> {
    model: &'a FittedModel,
    x_test: &'a FeatureMatrix,
    plot_dir: Option<PathBuf>,
}

impl<'a> FeatureInterpreter<'a> {
    pub fn new(model: &'a FittedModel, x_test: &'a FeatureMatrix) -> Self {
        Self {
            model,
            x_test,
            plot_dir: None,
        }
    }

    /// Also write a bar-chart summary into this directory.
    pub fn with_plot_dir(mut self, dir: &Path) -> Self {
        self.plot_dir = Some(dir.to_path_buf());
        self
    }

    /// Mean-absolute attribution per feature, top `top_n` first, plus the
    /// underlying per-row values. Writes the summary chart as a side
    /// effect when a plot directory is configured.
    pub fn attribution_summary(&self, top_n: usize) -> Result<AttributionSummary> {
        let (strategy, values) = match self.model.family() {
            ModelFamily::TreeEnsemble => ("tree-path", self.tree_attributions()?),
            ModelFamily::Linear => ("linear", self.linear_attributions()?),
            ModelFamily::Opaque => (
                "occlusion",
                occlusion_attributions(
                    |x| self.model.predict_raw(x),
                    &self.x_test.values,
                    &self.x_test.column_means(),
                )?,
            ),
        };

        let n_rows = values.nrows();
        let mut ranked: Vec<(String, f64)> = self
            .x_test
            .names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let mean_abs = if n_rows == 0 {
                    0.0
                } else {
                    (0..n_rows).map(|i| values[[i, j]].abs()).sum::<f64>() / n_rows as f64
                };
                (name.clone(), mean_abs)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_n);

        if let Some(dir) = &self.plot_dir {
            plot::attribution_chart(&ranked, &dir.join("attribution_summary.png"))?;
        }

        Ok(AttributionSummary {
            strategy,
            table: ranked,
            values,
        })
    }

    /// Decision-path attribution summed over the ensemble's trees.
    fn tree_attributions(&self) -> Result<Array2<f64>> {
        let x = &self.x_test.values;
        let mut values = Array2::<f64>::zeros((x.nrows(), x.ncols()));

        for i in 0..x.nrows() {
            let row = x.row(i);
            let mut out = vec![0.0; x.ncols()];
            match self.model {
                FittedModel::ForestRegressor(m) | FittedModel::ForestClassifier(m) => {
                    m.contributions(row, &mut out)
                }
                FittedModel::BoostedRegressor(m) | FittedModel::BoostedClassifier(m) => {
                    m.contributions(row, &mut out)
                }
                _ => return Err(anyhow!("{} has no decision paths", self.model.name())),
            }
            for (j, v) in out.into_iter().enumerate() {
                values[[i, j]] = v;
            }
        }

        Ok(values)
    }

    /// Coefficient times deviation from the background mean.
    fn linear_attributions(&self) -> Result<Array2<f64>> {
        let coefficients: Vec<f64> = match self.model {
            FittedModel::Linear(m) => m.coefficients(),
            FittedModel::Logistic(m) => m.coefficients().to_vec(),
            _ => return Err(anyhow!("{} has no coefficients", self.model.name())),
        };

        let x = &self.x_test.values;
        let means = self.x_test.column_means();
        let mut values = Array2::<f64>::zeros((x.nrows(), x.ncols()));
        for i in 0..x.nrows() {
            for j in 0..x.ncols() {
                values[[i, j]] = coefficients[j] * (x[[i, j]] - means[j]);
            }
        }
        Ok(values)
    }
}

/// Generic fallback: the attribution of feature `j` on row `i` is the
/// prediction change when that entry is replaced by the background mean.
pub fn occlusion_attributions<F>(
    predict: F,
    x: &Array2<f64>,
    background: &[f64],
) -> Result<Array2<f64>>
where
    F: Fn(&Array2<f64>) -> Result<Vec<f64>>,
{
    let base = predict(x)?;
    let mut values = Array2::<f64>::zeros((x.nrows(), x.ncols()));

    for j in 0..x.ncols() {
        let mut occluded = x.clone();
        for i in 0..x.nrows() {
            occluded[[i, j]] = background[j];
        }
        let altered = predict(&occluded)?;
        for i in 0..x.nrows() {
            values[[i, j]] = base[i] - altered[i];
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::boosting::{BoostParams, GradientBoosted};
    use crate::model::linear::LinearModel;
    use ndarray::Array2;

    fn feature_matrix(values: Array2<f64>) -> FeatureMatrix {
        FeatureMatrix {
            names: (0..values.ncols()).map(|j| format!("f{j}")).collect(),
            values,
        }
    }

    fn signal_data(n: usize) -> (Array2<f64>, Vec<f64>) {
        let mut x = Array2::<f64>::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            x[[i, 0]] = (i % 9) as f64;
            x[[i, 1]] = ((i * 5) % 3) as f64;
            y.push(4.0 * x[[i, 0]] + 2.0);
        }
        (x, y)
    }

    #[test]
    fn test_linear_strategy_ranks_the_informative_feature() {
        let (x, y) = signal_data(50);
        let model = FittedModel::Linear(LinearModel::fit(&x, &y).unwrap());
        let matrix = feature_matrix(x);

        let summary = FeatureInterpreter::new(&model, &matrix)
            .attribution_summary(2)
            .unwrap();

        assert_eq!(summary.strategy, "linear");
        assert_eq!(summary.table[0].0, "f0");
        assert!(summary.table[0].1 > 10.0 * summary.table[1].1.max(1e-12));
    }

    #[test]
    fn test_tree_strategy_ranks_the_informative_feature() {
        let (x, y) = signal_data(60);
        let params = BoostParams {
            n_trees: 30,
            max_depth: 3,
            learning_rate: 0.2,
            min_samples_leaf: 2,
        };
        let model =
            FittedModel::BoostedRegressor(GradientBoosted::fit_regressor(&x, &y, &params));
        let matrix = feature_matrix(x);

        let summary = FeatureInterpreter::new(&model, &matrix)
            .attribution_summary(5)
            .unwrap();

        assert_eq!(summary.strategy, "tree-path");
        // top_n larger than the feature count returns everything.
        assert_eq!(summary.table.len(), 2);
        assert_eq!(summary.table[0].0, "f0");
        assert_eq!(summary.values.nrows(), matrix.n_rows());
    }

    #[test]
    fn test_occlusion_fallback_on_an_opaque_predictor() {
        let mut x = Array2::<f64>::zeros((10, 2));
        for i in 0..10 {
            x[[i, 0]] = i as f64;
            x[[i, 1]] = (i % 2) as f64;
        }
        let means = vec![4.5, 0.5];

        // Opaque black box: only the first feature matters.
        let predict =
            |m: &Array2<f64>| Ok((0..m.nrows()).map(|i| 3.0 * m[[i, 0]]).collect::<Vec<f64>>());

        let values = occlusion_attributions(predict, &x, &means).unwrap();
        for i in 0..10 {
            assert!((values[[i, 0]] - 3.0 * (x[[i, 0]] - 4.5)).abs() < 1e-9);
            assert_eq!(values[[i, 1]], 0.0);
        }
    }
}
