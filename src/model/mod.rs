//! Model module - training, evaluation, and attribution

pub mod boosting;
pub mod explain;
pub mod forest;
pub mod linear;
pub mod metrics;
pub mod trainer;
pub mod tree;

pub use boosting::{BoostParams, GradientBoosted};
pub use explain::{AttributionSummary, FeatureInterpreter};
pub use forest::{ForestParams, RandomForest};
pub use linear::{LinearModel, LogisticModel};
pub use metrics::{ClassificationReport, RegressionReport};
pub use trainer::ModelTrainer;

use anyhow::{anyhow, Result};
use ndarray::Array2;

/// The closed set of model families the interpreter can dispatch on.
/// `Opaque` is the explicit fallback arm for predict-only estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Linear,
    TreeEnsemble,
    Opaque,
}

/// A fitted estimator, tagged by what it is rather than by type-name
/// string matching.
pub enum FittedModel {
    Linear(LinearModel),
    Logistic(LogisticModel),
    ForestRegressor(RandomForest),
    ForestClassifier(RandomForest),
    BoostedRegressor(GradientBoosted),
    BoostedClassifier(GradientBoosted),
}

impl FittedModel {
    pub fn family(&self) -> ModelFamily {
        match self {
            FittedModel::Linear(_) | FittedModel::Logistic(_) => ModelFamily::Linear,
            FittedModel::ForestRegressor(_)
            | FittedModel::ForestClassifier(_)
            | FittedModel::BoostedRegressor(_)
            | FittedModel::BoostedClassifier(_) => ModelFamily::TreeEnsemble,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FittedModel::Linear(_) => "Linear Regression",
            FittedModel::Logistic(_) => "Logistic Regression",
            FittedModel::ForestRegressor(_) => "Random Forest Regressor",
            FittedModel::ForestClassifier(_) => "Random Forest Classifier",
            FittedModel::BoostedRegressor(_) => "Gradient Boosted Regressor",
            FittedModel::BoostedClassifier(_) => "Gradient Boosted Classifier",
        }
    }

    pub fn is_classifier(&self) -> bool {
        matches!(
            self,
            FittedModel::Logistic(_)
                | FittedModel::ForestClassifier(_)
                | FittedModel::BoostedClassifier(_)
        )
    }

    /// Regression predictions on the target scale.
    pub fn predict_values(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        match self {
            FittedModel::Linear(m) => m.predict(x),
            FittedModel::ForestRegressor(m) => Ok(m.predict(x)),
            FittedModel::BoostedRegressor(m) => Ok(m.predict_margin(x)),
            _ => Err(anyhow!("{} is not a regression model", self.name())),
        }
    }

    /// Positive-class probabilities.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        match self {
            FittedModel::Logistic(m) => Ok(m.predict_proba(x)),
            FittedModel::ForestClassifier(m) => Ok(m.predict(x)),
            FittedModel::BoostedClassifier(m) => Ok(m.predict_proba(x)),
            _ => Err(anyhow!("{} is not a classification model", self.name())),
        }
    }

    /// Hard 0/1 labels at the 0.5 probability threshold.
    pub fn predict_labels(&self, x: &Array2<f64>) -> Result<Vec<i32>> {
        match self {
            FittedModel::Logistic(m) => m.predict_labels(x),
            _ => Ok(self
                .predict_proba(x)?
                .into_iter()
                .map(|p| (p >= 0.5) as i32)
                .collect()),
        }
    }

    /// Raw model output used for attribution: target scale for
    /// regressors, positive-class log-odds (margin) for classifiers where
    /// available, probability for the forest classifier.
    pub fn predict_raw(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        match self {
            FittedModel::Linear(m) => m.predict(x),
            FittedModel::Logistic(m) => Ok(m.predict_margin(x)),
            FittedModel::ForestRegressor(m) | FittedModel::ForestClassifier(m) => {
                Ok(m.predict(x))
            }
            FittedModel::BoostedRegressor(m) | FittedModel::BoostedClassifier(m) => {
                Ok(m.predict_margin(x))
            }
        }
    }
}
