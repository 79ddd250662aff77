//! Exact-greedy regression tree fitter.
//!
//! Fits a single depth-capped least-squares tree against pseudo-residuals.
//! Split candidates are the distinct sorted values of each feature among the
//! rows at a node; candidate evaluation is parallel across feature columns.

use std::cmp::Ordering;

use ndarray::ArrayView2;

use crate::repr::{NodeId, Tree};
use crate::utils::Parallelism;

use super::TrainError;

/// A node whose residual SSE falls below this is treated as pure.
const PURITY_EPS: f64 = 1e-12;

/// Limits controlling tree growth.
#[derive(Debug, Clone)]
pub struct FitterParams {
    /// Maximum split depth; 1 produces decision stumps.
    pub max_depth: usize,
    /// Minimum number of rows a node must keep to be considered for a split.
    pub min_leaf: usize,
}

impl Default for FitterParams {
    fn default() -> Self {
        Self { max_depth: 3, min_leaf: 1 }
    }
}

// =============================================================================
// Split candidates
// =============================================================================

/// Best split found for one node, before or after the cross-feature reduce.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    error: f64,
}

impl SplitCandidate {
    /// Deterministic ordering: strictly lower error wins; ties fall to the
    /// lowest feature index, then the lowest threshold.
    fn beats(&self, other: &SplitCandidate) -> bool {
        match self.error.partial_cmp(&other.error) {
            Some(Ordering::Less) => true,
            Some(Ordering::Greater) => false,
            _ => {
                self.feature < other.feature
                    || (self.feature == other.feature && self.threshold < other.threshold)
            }
        }
    }
}

// =============================================================================
// Tree builder
// =============================================================================

/// Mutable SoA buffers filled during growth and frozen into a [`Tree`].
#[derive(Default)]
struct TreeBuilder {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f64>,
    left_children: Vec<u32>,
    right_children: Vec<u32>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<f64>,
}

impl TreeBuilder {
    fn push_leaf(&mut self, value: f64) -> NodeId {
        let id = self.is_leaf.len() as NodeId;
        self.split_indices.push(0);
        self.split_thresholds.push(0.0);
        self.left_children.push(0);
        self.right_children.push(0);
        self.is_leaf.push(true);
        self.leaf_values.push(value);
        id
    }

    fn push_split(&mut self, feature: u32, threshold: f64) -> NodeId {
        let id = self.is_leaf.len() as NodeId;
        self.split_indices.push(feature);
        self.split_thresholds.push(threshold);
        // Children are patched in once the subtrees are grown.
        self.left_children.push(0);
        self.right_children.push(0);
        self.is_leaf.push(false);
        self.leaf_values.push(0.0);
        id
    }

    fn set_children(&mut self, node: NodeId, left: NodeId, right: NodeId) {
        self.left_children[node as usize] = left;
        self.right_children[node as usize] = right;
    }

    fn freeze(self) -> Tree {
        Tree::new(
            self.split_indices,
            self.split_thresholds,
            self.left_children,
            self.right_children,
            self.is_leaf,
            self.leaf_values,
        )
    }
}

// =============================================================================
// TreeFitter
// =============================================================================

/// Fits a single regression tree against a residual vector.
#[derive(Debug, Clone)]
pub struct TreeFitter {
    params: FitterParams,
    parallelism: Parallelism,
}

impl TreeFitter {
    pub fn new(params: FitterParams, parallelism: Parallelism) -> Self {
        Self { params, parallelism }
    }

    /// Fit a tree approximating `residuals` over `features`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the residual length does not match the row count
    /// or the matrix has no columns or rows. `Invariant` if the chosen split
    /// produces an empty partition (unreachable by construction).
    pub fn fit(
        &self,
        features: ArrayView2<'_, f64>,
        residuals: &[f64],
    ) -> Result<Tree, TrainError> {
        let n_rows = features.nrows();
        if residuals.len() != n_rows {
            return Err(TrainError::InvalidInput {
                reason: format!(
                    "residual length {} does not match row count {}",
                    residuals.len(),
                    n_rows
                ),
            });
        }
        if n_rows == 0 {
            return Err(TrainError::InvalidInput {
                reason: "feature matrix has no rows".to_string(),
            });
        }
        if features.ncols() == 0 {
            return Err(TrainError::InvalidInput {
                reason: "feature matrix has no columns".to_string(),
            });
        }

        let mut builder = TreeBuilder::default();
        let rows: Vec<usize> = (0..n_rows).collect();
        let root = self.grow(&mut builder, features, residuals, rows, 0)?;
        debug_assert_eq!(root, 0, "root must be the first node");

        Ok(builder.freeze())
    }

    /// Grow the subtree for `rows`, returning its root node id.
    fn grow(
        &self,
        builder: &mut TreeBuilder,
        features: ArrayView2<'_, f64>,
        residuals: &[f64],
        rows: Vec<usize>,
        depth: usize,
    ) -> Result<NodeId, TrainError> {
        let n = rows.len() as f64;
        let (sum, sum_sq) = rows.iter().fold((0.0f64, 0.0f64), |(s, sq), &row| {
            let r = residuals[row];
            (s + r, sq + r * r)
        });
        let mean = sum / n;
        let node_sse = sum_sq - sum * sum / n;

        // Leaf conditions: depth cap, too few rows to split, residual-pure.
        if depth >= self.params.max_depth
            || rows.len() < self.params.min_leaf.max(2)
            || node_sse <= PURITY_EPS
        {
            return Ok(builder.push_leaf(mean));
        }

        // No candidate strictly reduces the node's own SSE: emit a leaf.
        let Some(best) = self.best_split(features, residuals, &rows, sum, sum_sq, node_sse) else {
            return Ok(builder.push_leaf(mean));
        };

        let node = builder.push_split(best.feature as u32, best.threshold);

        let column = features.column(best.feature);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&row| column[row] < best.threshold);

        if left_rows.is_empty() || right_rows.is_empty() {
            return Err(TrainError::Invariant {
                reason: format!(
                    "split on feature {} at threshold {} produced an empty partition",
                    best.feature, best.threshold
                ),
            });
        }

        let left = self.grow(builder, features, residuals, left_rows, depth + 1)?;
        let right = self.grow(builder, features, residuals, right_rows, depth + 1)?;
        builder.set_children(node, left, right);

        Ok(node)
    }

    /// Search every feature for the best split of `rows`.
    ///
    /// Per-feature scans run in parallel; the reduce applies the same
    /// (error, feature, threshold) ordering as the sequential scan, so the
    /// winner is identical either way.
    fn best_split(
        &self,
        features: ArrayView2<'_, f64>,
        residuals: &[f64],
        rows: &[usize],
        node_sum: f64,
        node_sq: f64,
        node_sse: f64,
    ) -> Option<SplitCandidate> {
        let n_features = features.ncols();

        let per_feature: Vec<Option<SplitCandidate>> =
            self.parallelism.maybe_par_map(0..n_features, |feature| {
                best_split_for_feature(features, residuals, rows, feature, node_sum, node_sq, node_sse)
            });

        per_feature
            .into_iter()
            .flatten()
            .reduce(|best, candidate| if candidate.beats(&best) { candidate } else { best })
    }
}

/// Scan one feature column for its best split.
///
/// Rows are sorted by feature value; a prefix-sum pass evaluates every
/// boundary between distinct values. Thresholds are the distinct values
/// themselves (split rule: `value < threshold`), so the minimum value never
/// becomes a threshold and empty partitions cannot arise.
fn best_split_for_feature(
    features: ArrayView2<'_, f64>,
    residuals: &[f64],
    rows: &[usize],
    feature: usize,
    node_sum: f64,
    node_sq: f64,
    node_sse: f64,
) -> Option<SplitCandidate> {
    let column = features.column(feature);

    let mut order: Vec<usize> = rows.to_vec();
    order.sort_by(|&a, &b| column[a].partial_cmp(&column[b]).unwrap_or(Ordering::Equal));

    let n = order.len() as f64;
    let mut left_sum = 0.0f64;
    let mut left_sq = 0.0f64;
    let mut left_n = 0.0f64;

    let mut best: Option<SplitCandidate> = None;

    for i in 0..order.len() - 1 {
        let r = residuals[order[i]];
        left_sum += r;
        left_sq += r * r;
        left_n += 1.0;

        // Only a boundary between distinct values is a candidate.
        if column[order[i]] >= column[order[i + 1]] {
            continue;
        }

        let right_sum = node_sum - left_sum;
        let right_sq = node_sq - left_sq;
        let right_n = n - left_n;

        let error = (left_sq - left_sum * left_sum / left_n)
            + (right_sq - right_sum * right_sum / right_n);

        if error < node_sse {
            let candidate = SplitCandidate { feature, threshold: column[order[i + 1]], error };
            if best.map_or(true, |b| candidate.beats(&b)) {
                best = Some(candidate);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn fit(
        features: &ndarray::Array2<f64>,
        residuals: &[f64],
        max_depth: usize,
    ) -> Result<Tree, TrainError> {
        let fitter = TreeFitter::new(
            FitterParams { max_depth, min_leaf: 1 },
            Parallelism::Sequential,
        );
        fitter.fit(features.view(), residuals)
    }

    #[test]
    fn stump_splits_at_obvious_boundary() {
        let features = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
        let residuals = [-0.5, -0.5, 0.5, 0.5];

        let tree = fit(&features, &residuals, 1).unwrap();
        assert_eq!(tree.n_nodes(), 3);
        assert!(!tree.is_leaf(0));
        assert_eq!(tree.split_index(0), 0);
        assert_eq!(tree.split_threshold(0), 2.0);
        assert_eq!(tree.predict_row(features.row(0)), -0.5);
        assert_eq!(tree.predict_row(features.row(3)), 0.5);
    }

    #[test]
    fn constant_residuals_yield_single_leaf() {
        let features = arr2(&[[0.0], [1.0], [2.0]]);
        let residuals = [0.25, 0.25, 0.25];

        let tree = fit(&features, &residuals, 3).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert!(tree.is_leaf(0));
        assert_eq!(tree.leaf_value(0), 0.25);
    }

    #[test]
    fn constant_feature_yields_single_leaf() {
        // No boundary between distinct values exists, so no split candidate.
        let features = arr2(&[[7.0], [7.0], [7.0]]);
        let residuals = [-1.0, 0.0, 1.0];

        let tree = fit(&features, &residuals, 3).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.leaf_value(0), 0.0);
    }

    #[test]
    fn leaf_value_is_mean_residual() {
        let features = arr2(&[[0.0], [1.0], [10.0], [11.0]]);
        let residuals = [1.0, 3.0, -2.0, -4.0];

        let tree = fit(&features, &residuals, 1).unwrap();
        let left = tree.left_child(0);
        let right = tree.right_child(0);
        assert_eq!(tree.leaf_value(left), 2.0);
        assert_eq!(tree.leaf_value(right), -3.0);
    }

    #[test]
    fn tie_break_prefers_lowest_feature() {
        // Both features separate the residuals perfectly; feature 0 must win.
        let features = arr2(&[[0.0, 0.0], [0.0, 0.0], [1.0, 1.0], [1.0, 1.0]]);
        let residuals = [-1.0, -1.0, 1.0, 1.0];

        let tree = fit(&features, &residuals, 1).unwrap();
        assert_eq!(tree.split_index(0), 0);
        assert_eq!(tree.split_threshold(0), 1.0);
    }

    #[test]
    fn tie_break_prefers_lowest_threshold() {
        // Residuals are symmetric around every boundary of a 3-level feature;
        // splitting at 1.0 or 2.0 gives equal error, so 1.0 must win.
        let features = arr2(&[[0.0], [1.0], [2.0]]);
        let residuals = [1.0, 0.0, 1.0];

        let tree = fit(&features, &residuals, 1).unwrap();
        assert_eq!(tree.split_threshold(0), 1.0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let features = arr2(&[
            [0.3, 5.0, -1.0],
            [0.7, 2.0, -0.5],
            [0.1, 8.0, 0.0],
            [0.9, 1.0, 0.5],
            [0.5, 4.0, 1.0],
            [0.2, 6.0, 1.5],
        ]);
        let residuals = [0.4, -0.3, 0.2, -0.6, 0.1, 0.3];

        let sequential = TreeFitter::new(FitterParams::default(), Parallelism::Sequential)
            .fit(features.view(), &residuals)
            .unwrap();
        let parallel = TreeFitter::new(FitterParams::default(), Parallelism::Parallel)
            .fit(features.view(), &residuals)
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn min_leaf_blocks_splitting_small_nodes() {
        let features = arr2(&[[0.0], [1.0], [2.0], [3.0]]);
        let residuals = [-1.0, -0.5, 0.5, 1.0];

        let fitter = TreeFitter::new(
            FitterParams { max_depth: 5, min_leaf: 4 },
            Parallelism::Sequential,
        );
        let tree = fitter.fit(features.view(), &residuals).unwrap();
        // Root may split (4 rows >= min_leaf), children (2 rows) may not.
        for node in 0..tree.n_nodes() as u32 {
            if !tree.is_leaf(node) {
                assert_eq!(node, 0);
            }
        }
    }

    #[test]
    fn shape_mismatch_is_invalid_input() {
        let features = arr2(&[[0.0], [1.0]]);
        let err = fit(&features, &[0.1], 3).unwrap_err();
        assert!(matches!(err, TrainError::InvalidInput { .. }));
    }

    #[test]
    fn zero_columns_is_invalid_input() {
        let features = ndarray::Array2::<f64>::zeros((3, 0));
        let fitter = TreeFitter::new(FitterParams::default(), Parallelism::Sequential);
        let err = fitter.fit(features.view(), &[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, TrainError::InvalidInput { .. }));
    }

    #[test]
    fn fitted_trees_are_structurally_valid() {
        let features = arr2(&[[0.1, 1.0], [0.4, 3.0], [0.6, 2.0], [0.9, 0.5], [0.2, 2.5]]);
        let residuals = [0.3, -0.2, 0.5, -0.4, 0.1];

        let tree = fit(&features, &residuals, 4).unwrap();
        assert!(tree.validate().is_ok());
    }
}
