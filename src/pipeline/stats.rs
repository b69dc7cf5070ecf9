//! Statistical test kernels
//!
//! Contingency chi-square, Welch's t-test, and rank correlation, computed to
//! match the SciPy reference results the original analyses were built on.
//! P-values come from `statrs` distribution CDFs.

use anyhow::{anyhow, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

/// Result of a chi-square independence test.
#[derive(Debug, Clone)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
}

/// Result of a two-sample t-test.
#[derive(Debug, Clone)]
pub struct TTest {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: f64,
}

/// Chi-square test of independence on an observed contingency table.
///
/// Rows and columns that sum to zero are discarded before computing
/// expected frequencies. Yates continuity correction is applied to 2x2
/// tables, matching the SciPy default.
pub fn chi_square_from_table(observed: &[Vec<f64>]) -> Result<ChiSquareTest> {
    // Drop empty margins first; they contribute nothing to the statistic.
    let col_count = observed.first().map(|r| r.len()).unwrap_or(0);
    let row_keep: Vec<usize> = (0..observed.len())
        .filter(|&i| observed[i].iter().sum::<f64>() > 0.0)
        .collect();
    let col_keep: Vec<usize> = (0..col_count)
        .filter(|&j| row_keep.iter().map(|&i| observed[i][j]).sum::<f64>() > 0.0)
        .collect();

    let n_rows = row_keep.len();
    let n_cols = col_keep.len();
    if n_rows < 2 || n_cols < 2 {
        return Err(anyhow!(
            "contingency table must have at least 2 non-empty rows and columns"
        ));
    }

    let row_sums: Vec<f64> = row_keep
        .iter()
        .map(|&i| col_keep.iter().map(|&j| observed[i][j]).sum())
        .collect();
    let col_sums: Vec<f64> = col_keep
        .iter()
        .map(|&j| row_keep.iter().map(|&i| observed[i][j]).sum())
        .collect();
    let total: f64 = row_sums.iter().sum();

    let yates = n_rows == 2 && n_cols == 2;
    let mut statistic = 0.0;
    for (ri, &i) in row_keep.iter().enumerate() {
        for (ci, &j) in col_keep.iter().enumerate() {
            let expected = row_sums[ri] * col_sums[ci] / total;
            let mut deviation = (observed[i][j] - expected).abs();
            if yates {
                deviation = (deviation - 0.5).max(0.0);
            }
            statistic += deviation * deviation / expected;
        }
    }

    let dof = (n_rows - 1) * (n_cols - 1);
    let dist = ChiSquared::new(dof as f64).map_err(|e| anyhow!("chi-square dof: {e}"))?;
    let p_value = 1.0 - dist.cdf(statistic);

    Ok(ChiSquareTest {
        statistic,
        p_value,
        dof,
    })
}

/// Welch's unequal-variance t-test (two-sided).
pub fn welch_t_test(group1: &[f64], group2: &[f64]) -> Result<TTest> {
    let n1 = group1.len();
    let n2 = group2.len();
    if n1 < 2 || n2 < 2 {
        return Err(anyhow!(
            "t-test needs at least 2 observations per group, got {n1} and {n2}"
        ));
    }

    let (m1, v1) = mean_and_variance(group1);
    let (m2, v2) = mean_and_variance(group2);
    let se_sq = v1 / n1 as f64 + v2 / n2 as f64;

    if se_sq == 0.0 {
        // Constant groups: either identical (no evidence) or trivially split.
        let statistic = if m1 == m2 { 0.0 } else { f64::INFINITY };
        let p_value = if m1 == m2 { 1.0 } else { 0.0 };
        return Ok(TTest {
            statistic,
            p_value,
            dof: (n1 + n2 - 2) as f64,
        });
    }

    let statistic = (m1 - m2) / se_sq.sqrt();

    // Welch-Satterthwaite degrees of freedom.
    let a = v1 / n1 as f64;
    let b = v2 / n2 as f64;
    let dof = se_sq * se_sq / (a * a / (n1 as f64 - 1.0) + b * b / (n2 as f64 - 1.0));

    let dist = StudentsT::new(0.0, 1.0, dof).map_err(|e| anyhow!("t distribution: {e}"))?;
    let p_value = 2.0 * (1.0 - dist.cdf(statistic.abs()));

    Ok(TTest {
        statistic,
        p_value,
        dof,
    })
}

/// Pearson correlation, `None` when either side is constant or too short.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Spearman rank correlation (average ranks for ties).
pub fn spearman_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }
    let rx = average_ranks(x);
    let ry = average_ranks(y);
    pearson_correlation(&rx, &ry)
}

/// 1-based ranks, ties receiving the mean of their positions.
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chi_square_2x2_applies_yates() {
        // scipy.stats.chi2_contingency([[10, 20], [20, 10]])
        let table = vec![vec![10.0, 20.0], vec![20.0, 10.0]];
        let result = chi_square_from_table(&table).unwrap();
        assert!((result.statistic - 5.4).abs() < 1e-9);
        assert_eq!(result.dof, 1);
        assert!((result.p_value - 0.0201).abs() < 1e-3);
    }

    #[test]
    fn test_chi_square_larger_table() {
        // scipy.stats.chi2_contingency([[10,10],[10,20],[30,10]], correction irrelevant
        let table = vec![
            vec![10.0, 10.0],
            vec![10.0, 20.0],
            vec![30.0, 10.0],
        ];
        let result = chi_square_from_table(&table).unwrap();
        assert!((result.statistic - 12.375).abs() < 1e-3);
        assert_eq!(result.dof, 2);
        assert!((result.p_value - 0.002056).abs() < 1e-4);
    }

    #[test]
    fn test_chi_square_rejects_degenerate_tables() {
        let table = vec![vec![10.0, 20.0]];
        assert!(chi_square_from_table(&table).is_err());

        let empty_col = vec![vec![10.0, 0.0], vec![20.0, 0.0]];
        assert!(chi_square_from_table(&empty_col).is_err());
    }

    #[test]
    fn test_welch_t_test_matches_scipy() {
        // scipy.stats.ttest_ind(a, b, equal_var=False) -> t=-1.8974, p=0.1072
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0];
        let result = welch_t_test(&a, &b).unwrap();
        assert!((result.statistic + 1.8974).abs() < 1e-3);
        assert!((result.dof - 5.8824).abs() < 1e-3);
        assert!((result.p_value - 0.1072).abs() < 1e-3);
    }

    #[test]
    fn test_welch_identical_constant_groups() {
        let a = [5.0, 5.0, 5.0];
        let b = [5.0, 5.0];
        let result = welch_t_test(&a, &b).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_spearman_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let up = [10.0, 20.0, 25.0, 100.0];
        let down = [4.0, 3.0, 2.0, 1.0];
        assert!((spearman_correlation(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((spearman_correlation(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 20.0, 30.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }
}
