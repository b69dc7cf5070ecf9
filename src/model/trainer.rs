//! Model training and evaluation for one task's split
//!
//! Holds the train/test matrices and labels for either the frequency
//! (classification) or severity (regression) task and exposes one training
//! method per estimator, mirroring the modeling notebook flow: fit on the
//! held training data, evaluate on the held-out test partition.

use anyhow::{Context, Result};

use super::boosting::{BoostParams, GradientBoosted};
use super::forest::{ForestParams, RandomForest};
use super::linear::{LinearModel, LogisticModel};
use super::metrics::{
    accuracy, f1_score, precision, r_squared, recall, rmse, roc_auc, ClassificationReport,
    RegressionReport,
};
use super::FittedModel;
use crate::pipeline::features::FeatureMatrix;

pub struct ModelTrainer {
    x_train: FeatureMatrix,
    x_test: FeatureMatrix,
    y_train: Vec<f64>,
    y_test: Vec<f64>,
}

impl ModelTrainer {
    pub fn new(
        x_train: FeatureMatrix,
        x_test: FeatureMatrix,
        y_train: Vec<f64>,
        y_test: Vec<f64>,
    ) -> Self {
        Self {
            x_train,
            x_test,
            y_train,
            y_test,
        }
    }

    pub fn x_test(&self) -> &FeatureMatrix {
        &self.x_test
    }

    fn train_labels(&self) -> Vec<i32> {
        self.y_train.iter().map(|&v| (v > 0.0) as i32).collect()
    }

    // Classification task

    pub fn train_logistic_regression(&self) -> Result<FittedModel> {
        let model = LogisticModel::fit(&self.x_train.values, &self.train_labels())
            .context("training logistic regression")?;
        Ok(FittedModel::Logistic(model))
    }

    /// Defaults: 200 trees, depth 10, seed 42.
    pub fn train_random_forest_classifier(&self, params: ForestParams) -> Result<FittedModel> {
        let forest = RandomForest::fit(&self.x_train.values, &self.y_train, &params);
        Ok(FittedModel::ForestClassifier(forest))
    }

    /// Defaults: 200 trees, depth 6, learning rate 0.1.
    pub fn train_gradient_boosted_classifier(&self, params: BoostParams) -> Result<FittedModel> {
        let model = GradientBoosted::fit_classifier(&self.x_train.values, &self.y_train, &params);
        Ok(FittedModel::BoostedClassifier(model))
    }

    // Regression task

    pub fn train_linear_regression(&self) -> Result<FittedModel> {
        let model = LinearModel::fit(&self.x_train.values, &self.y_train)
            .context("training linear regression")?;
        Ok(FittedModel::Linear(model))
    }

    /// Defaults: 200 trees, depth 10, seed 42.
    pub fn train_random_forest_regressor(&self, params: ForestParams) -> Result<FittedModel> {
        let forest = RandomForest::fit(&self.x_train.values, &self.y_train, &params);
        Ok(FittedModel::ForestRegressor(forest))
    }

    /// Defaults: 200 trees, depth 6, learning rate 0.1.
    pub fn train_gradient_boosted_regressor(&self, params: BoostParams) -> Result<FittedModel> {
        let model = GradientBoosted::fit_regressor(&self.x_train.values, &self.y_train, &params);
        Ok(FittedModel::BoostedRegressor(model))
    }

    // Evaluation

    /// RMSE and R² on the held-out partition. Negative predictions are
    /// clamped to zero: claim amounts cannot be negative.
    pub fn evaluate_regression(&self, model: &FittedModel) -> Result<RegressionReport> {
        let predictions: Vec<f64> = model
            .predict_values(&self.x_test.values)?
            .into_iter()
            .map(|p| p.max(0.0))
            .collect();

        Ok(RegressionReport {
            rmse: rmse(&self.y_test, &predictions),
            r_squared: r_squared(&self.y_test, &predictions),
        })
    }

    /// Accuracy, precision, recall, F1, and ROC AUC on the held-out
    /// partition.
    pub fn evaluate_classification(&self, model: &FittedModel) -> Result<ClassificationReport> {
        let labels = model.predict_labels(&self.x_test.values)?;
        let proba = model.predict_proba(&self.x_test.values)?;
        let truth: Vec<i32> = self.y_test.iter().map(|&v| (v > 0.0) as i32).collect();

        Ok(ClassificationReport {
            accuracy: accuracy(&truth, &labels),
            precision: precision(&truth, &labels),
            recall: recall(&truth, &labels),
            f1: f1_score(&truth, &labels),
            roc_auc: roc_auc(&truth, &proba),
        })
    }
}
