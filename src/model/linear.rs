//! Linear and logistic estimators backed by smartcore

use anyhow::{anyhow, Result};
use ndarray::Array2;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

fn to_dense(x: &Array2<f64>) -> DenseMatrix<f64> {
    // ndarray's default layout is row-major, which is what the `false`
    // column-major flag expects.
    let data: Vec<f64> = x.iter().copied().collect();
    DenseMatrix::new(x.nrows(), x.ncols(), data, false)
}

fn flatten(m: &DenseMatrix<f64>) -> Vec<f64> {
    let (rows, cols) = m.shape();
    (0..rows)
        .flat_map(|i| (0..cols).map(move |j| *m.get((i, j))))
        .collect()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Ordinary least squares severity model.
pub struct LinearModel {
    model: LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl LinearModel {
    pub fn fit(x: &Array2<f64>, y: &[f64]) -> Result<Self> {
        // SVD tolerates the rank-deficient matrices one-hot encoding can
        // produce on small subsets.
        let params =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
        let model = LinearRegression::fit(&to_dense(x), &y.to_vec(), params)
            .map_err(|e| anyhow!("failed to fit linear regression: {e}"))?;
        Ok(Self { model })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.model
            .predict(&to_dense(x))
            .map_err(|e| anyhow!("linear regression prediction failed: {e}"))
    }

    /// Per-feature weights, flattened out of smartcore's matrix form.
    pub fn coefficients(&self) -> Vec<f64> {
        flatten(self.model.coefficients())
    }
}

/// Logistic claim-occurrence model.
pub struct LogisticModel {
    model: LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn fit(x: &Array2<f64>, y: &[i32]) -> Result<Self> {
        let model = LogisticRegression::fit(
            &to_dense(x),
            &y.to_vec(),
            LogisticRegressionParameters::default(),
        )
        .map_err(|e| anyhow!("failed to fit logistic regression: {e}"))?;

        let coefficients = flatten(model.coefficients());
        let intercept = flatten(model.intercept()).first().copied().unwrap_or(0.0);

        Ok(Self {
            model,
            coefficients,
            intercept,
        })
    }

    pub fn predict_labels(&self, x: &Array2<f64>) -> Result<Vec<i32>> {
        self.model
            .predict(&to_dense(x))
            .map_err(|e| anyhow!("logistic regression prediction failed: {e}"))
    }

    /// Positive-class log-odds. smartcore does not expose probabilities,
    /// so they are reconstructed from the fitted weights.
    pub fn predict_margin(&self, x: &Array2<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|i| {
                self.intercept
                    + x.row(i)
                        .iter()
                        .zip(self.coefficients.iter())
                        .map(|(v, w)| v * w)
                        .sum::<f64>()
            })
            .collect()
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        self.predict_margin(x).into_iter().map(sigmoid).collect()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_linear_model_recovers_a_line() {
        // y = 2 * x0 + 1, second feature pure noise-free constant slope 0.
        let x = arr2(&[
            [1.0, 3.0],
            [2.0, 1.0],
            [3.0, 4.0],
            [4.0, 2.0],
            [5.0, 5.0],
            [6.0, 0.0],
        ]);
        let y: Vec<f64> = x.rows().into_iter().map(|r| 2.0 * r[0] + 1.0).collect();

        let model = LinearModel::fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        for (pred, target) in preds.iter().zip(y.iter()) {
            assert!((pred - target).abs() < 1e-6, "{pred} vs {target}");
        }

        let coefficients = model.coefficients();
        assert!((coefficients[0] - 2.0).abs() < 1e-6);
        assert!(coefficients[1].abs() < 1e-6);
    }

    #[test]
    fn test_logistic_model_orders_probabilities() {
        let n = 40;
        let mut x = ndarray::Array2::<f64>::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = (i % 10) as f64;
            x[[i, 0]] = a;
            x[[i, 1]] = ((i * 7) % 4) as f64;
            y.push(if a >= 5.0 { 1i32 } else { 0 });
        }

        let model = LogisticModel::fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x);

        let mean_pos = proba
            .iter()
            .zip(y.iter())
            .filter(|(_, &t)| t == 1)
            .map(|(p, _)| *p)
            .sum::<f64>()
            / y.iter().filter(|&&t| t == 1).count() as f64;
        let mean_neg = proba
            .iter()
            .zip(y.iter())
            .filter(|(_, &t)| t == 0)
            .map(|(p, _)| *p)
            .sum::<f64>()
            / y.iter().filter(|&&t| t == 0).count() as f64;

        assert!(
            mean_pos > mean_neg + 0.2,
            "positive class not separated: {mean_pos} vs {mean_neg}"
        );
    }
}
