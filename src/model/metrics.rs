//! Evaluation metrics for the frequency and severity tasks

use serde::Serialize;

use crate::pipeline::stats::average_ranks;

/// Held-out regression quality.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionReport {
    pub rmse: f64,
    pub r_squared: f64,
}

/// Held-out classification quality.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

/// Coefficient of determination. A constant target scores 1.0 only for a
/// perfect fit, 0.0 otherwise.
pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn accuracy(y_true: &[i32], y_pred: &[i32]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Precision on the positive class; zero (not undefined) when nothing was
/// predicted positive.
pub fn precision(y_true: &[i32], y_pred: &[i32]) -> f64 {
    let tp = count_matches(y_true, y_pred, 1, 1);
    let fp = count_matches(y_true, y_pred, 0, 1);
    if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    }
}

pub fn recall(y_true: &[i32], y_pred: &[i32]) -> f64 {
    let tp = count_matches(y_true, y_pred, 1, 1);
    let fn_count = count_matches(y_true, y_pred, 1, 0);
    if tp + fn_count == 0 {
        0.0
    } else {
        tp as f64 / (tp + fn_count) as f64
    }
}

pub fn f1_score(y_true: &[i32], y_pred: &[i32]) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Area under the ROC curve via the rank-sum formulation, with tied
/// scores receiving average ranks. Degenerate single-class inputs score
/// an uninformative 0.5.
pub fn roc_auc(y_true: &[i32], scores: &[f64]) -> f64 {
    let n_pos = y_true.iter().filter(|&&t| t == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let ranks = average_ranks(scores);
    let rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t == 1)
        .map(|(_, r)| *r)
        .sum();

    (rank_sum - n_pos as f64 * (n_pos as f64 + 1.0) / 2.0) / (n_pos as f64 * n_neg as f64)
}

fn count_matches(y_true: &[i32], y_pred: &[i32], truth: i32, predicted: i32) -> usize {
    y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(&t, &p)| t == truth && p == predicted)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_metrics() {
        let y_true = [1.0, 2.0, 3.0, 4.0];
        let y_pred = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(rmse(&y_true, &y_pred), 0.0);
        assert_eq!(r_squared(&y_true, &y_pred), 1.0);

        let off = [2.0, 3.0, 4.0, 5.0];
        assert!((rmse(&y_true, &off) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_classification_metrics() {
        let y_true = [1, 1, 0, 0, 1, 0];
        let y_pred = [1, 0, 0, 1, 1, 0];
        assert!((accuracy(&y_true, &y_pred) - 4.0 / 6.0).abs() < 1e-12);
        assert!((precision(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
        assert!((f1_score(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions_scores_zero() {
        let y_true = [1, 0, 1, 0];
        let y_pred = [0, 0, 0, 0];
        assert_eq!(precision(&y_true, &y_pred), 0.0);
        assert_eq!(recall(&y_true, &y_pred), 0.0);
        assert_eq!(f1_score(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_and_random() {
        let y_true = [0, 0, 1, 1];
        let perfect = [0.1, 0.2, 0.8, 0.9];
        let inverted = [0.9, 0.8, 0.2, 0.1];
        assert!((roc_auc(&y_true, &perfect) - 1.0).abs() < 1e-12);
        assert!(roc_auc(&y_true, &inverted).abs() < 1e-12);

        let single_class = [1, 1, 1];
        assert_eq!(roc_auc(&single_class, &[0.1, 0.5, 0.9]), 0.5);
    }

    #[test]
    fn test_roc_auc_with_ties() {
        // One positive and one negative share the same score: AUC counts
        // the tie as half a concordant pair.
        let y_true = [0, 1, 0, 1];
        let scores = [0.1, 0.5, 0.5, 0.9];
        assert!((roc_auc(&y_true, &scores) - 0.875).abs() < 1e-12);
    }
}
