//! Regression tree used by the forest and boosting ensembles
//!
//! Greedy variance-reduction splits on a dense matrix. Every node stores
//! its training mean so a prediction can be decomposed along its decision
//! path into per-feature contributions.

use ndarray::{Array2, ArrayView1};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 5,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    root: usize,
}

impl RegressionTree {
    /// Fit on the given row subset of `x` (bootstrap samples pass
    /// duplicated indices).
    pub fn fit(x: &Array2<f64>, y: &[f64], rows: &[usize], params: &TreeParams) -> Self {
        let mut nodes = Vec::new();
        let root = build(x, y, rows, 0, params, &mut nodes);
        Self { nodes, root }
    }

    /// Mean of the training targets at the root.
    pub fn root_value(&self) -> f64 {
        match self.nodes[self.root] {
            Node::Leaf { value } => value,
            Node::Split { value, .. } => value,
        }
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = self.root;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Walk the decision path and attribute each prediction change to the
    /// feature that was split on, scaled by `scale`.
    pub fn accumulate_contributions(&self, row: ArrayView1<f64>, out: &mut [f64], scale: f64) {
        let mut idx = self.root;
        let mut current = self.root_value();
        loop {
            match self.nodes[idx] {
                Node::Leaf { .. } => return,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let next = if row[feature] <= threshold { left } else { right };
                    let next_value = match self.nodes[next] {
                        Node::Leaf { value } => value,
                        Node::Split { value, .. } => value,
                    };
                    out[feature] += scale * (next_value - current);
                    current = next_value;
                    idx = next;
                }
            }
        }
    }
}

fn mean(y: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64
}

/// Recursively grow the tree; returns the index of the created node.
fn build(
    x: &Array2<f64>,
    y: &[f64],
    rows: &[usize],
    depth: usize,
    params: &TreeParams,
    nodes: &mut Vec<Node>,
) -> usize {
    let value = mean(y, rows);
    if rows.is_empty() {
        nodes.push(Node::Leaf { value });
        return nodes.len() - 1;
    }

    let constant = rows.iter().all(|&r| y[r] == y[rows[0]]);
    let splittable =
        !constant && depth < params.max_depth && rows.len() >= 2 * params.min_samples_leaf;
    let split = if splittable {
        best_split(x, y, rows, params.min_samples_leaf)
    } else {
        None
    };

    match split {
        None => {
            nodes.push(Node::Leaf { value });
            nodes.len() - 1
        }
        Some((feature, threshold)) => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&r| x[[r, feature]] <= threshold);
            let left = build(x, y, &left_rows, depth + 1, params, nodes);
            let right = build(x, y, &right_rows, depth + 1, params, nodes);
            nodes.push(Node::Split {
                feature,
                threshold,
                value,
                left,
                right,
            });
            nodes.len() - 1
        }
    }
}

/// Exhaustive search for the split maximizing variance reduction.
fn best_split(
    x: &Array2<f64>,
    y: &[f64],
    rows: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64)> {
    let n = rows.len();
    let total_sum: f64 = rows.iter().map(|&r| y[r]).sum();

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, score)

    for feature in 0..x.ncols() {
        let mut ordered: Vec<usize> = rows.to_vec();
        ordered.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for i in 0..n - 1 {
            left_sum += y[ordered[i]];
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let here = x[[ordered[i], feature]];
            let next = x[[ordered[i + 1], feature]];
            if here == next {
                continue; // cannot split between equal values
            }

            let right_sum = total_sum - left_sum;
            // Maximizing this is equivalent to minimizing the split SSE.
            let score =
                left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;

            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((feature, (here + next) / 2.0, score));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}
