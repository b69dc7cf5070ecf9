//! Bagged regression-tree ensemble
//!
//! One implementation serves both tasks: regressors average raw tree
//! outputs, classifiers are trained on 0/1 labels so the average is the
//! positive-class probability.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::tree::{RegressionTree, TreeParams};

/// Forest hyperparameters. Defaults follow the trainer's documented
/// values: 200 trees of depth 10.
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 10,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// A fitted bagged ensemble.
#[derive(Debug)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit `n_trees` trees, each on a bootstrap resample of the rows.
    pub fn fit(x: &Array2<f64>, y: &[f64], params: &ForestParams) -> Self {
        let n_rows = x.nrows();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_leaf: params.min_samples_leaf,
        };

        let trees: Vec<RegressionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                RegressionTree::fit(x, y, &rows, &tree_params)
            })
            .collect();

        Self {
            trees,
            n_features: x.ncols(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<f64> {
        (0..x.nrows()).map(|i| self.predict_row(x.row(i))).collect()
    }

    /// Ensemble baseline: mean of the tree root values.
    pub fn baseline(&self) -> f64 {
        self.trees.iter().map(|t| t.root_value()).sum::<f64>() / self.trees.len() as f64
    }

    /// Per-feature path contributions for one row, averaged over trees.
    /// `baseline() + sum(out)` reconstructs the prediction.
    pub fn contributions(&self, row: ArrayView1<f64>, out: &mut [f64]) {
        let scale = 1.0 / self.trees.len() as f64;
        for tree in &self.trees {
            tree.accumulate_contributions(row, out, scale);
        }
    }
}
