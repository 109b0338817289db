//! CART regression tree.
//!
//! Splits minimise the summed squared error of the children. Thresholds are
//! midpoints between consecutive distinct feature values; rows with
//! `value <= threshold` go left.

use rand::prelude::*;

use crate::features::encode::FeatureMatrix;

/// Type alias for tree node indices.
pub type NodeId = u32;

/// Sentinel value for "no child" (leaf nodes).
pub const NO_CHILD: NodeId = u32::MAX;

/// A single tree node.
///
/// Struct layout (not enum) keeps nodes fixed-size; `is_leaf` distinguishes
/// split and leaf nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    /// Feature index for split.
    pub feature: u32,
    /// Split threshold (`value <= threshold` goes left).
    pub threshold: f64,
    pub left: NodeId,
    pub right: NodeId,
    /// Mean target of the training rows reaching this node.
    pub value: f64,
    pub is_leaf: bool,
}

impl TreeNode {
    #[inline]
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            left: NO_CHILD,
            right: NO_CHILD,
            value,
            is_leaf: true,
        }
    }
}

/// Growth limits for a single tree.
#[derive(Clone, Debug)]
pub struct TreeParams {
    /// `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features tried at each node.
    pub max_features: usize,
}

/// A trained regression tree. Nodes are stored depth-first, root at 0.
#[derive(Clone, Debug)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    /// Total squared-error reduction contributed by each feature.
    impurity_decrease: Vec<f64>,
    depth: usize,
}

struct PendingNode {
    id: usize,
    rows: Vec<usize>,
    depth: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    /// Parent SSE minus children SSE.
    gain: f64,
}

impl RegressionTree {
    /// Grow a tree on the given rows of `x`. Rows may repeat (bootstrap
    /// samples); a repeated row simply counts several times.
    pub fn fit<R: Rng>(x: &FeatureMatrix, rows: Vec<usize>, params: &TreeParams, rng: &mut R) -> Self {
        let mut tree = RegressionTree {
            nodes: vec![TreeNode::leaf(mean(&x.target, &rows))],
            impurity_decrease: vec![0.0; x.n_cols],
            depth: 0,
        };
        let mut features: Vec<usize> = (0..x.n_cols).collect();
        let mut stack = vec![PendingNode { id: 0, rows, depth: 0 }];

        while let Some(node) = stack.pop() {
            tree.depth = tree.depth.max(node.depth);

            let can_split = node.rows.len() >= params.min_samples_split
                && node.rows.len() >= 2 * params.min_samples_leaf
                && params.max_depth.map_or(true, |d| node.depth < d);
            if !can_split {
                continue;
            }

            features.shuffle(rng);
            let candidates = &features[..params.max_features.clamp(1, x.n_cols.max(1))];
            let Some(split) = best_split(x, &node.rows, candidates, params.min_samples_leaf) else {
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = node
                .rows
                .iter()
                .partition(|&&r| x.get(r, split.feature) <= split.threshold);

            let left_id = tree.nodes.len();
            tree.nodes.push(TreeNode::leaf(mean(&x.target, &left_rows)));
            let right_id = tree.nodes.len();
            tree.nodes.push(TreeNode::leaf(mean(&x.target, &right_rows)));

            let parent = &mut tree.nodes[node.id];
            parent.is_leaf = false;
            parent.feature = split.feature as u32;
            parent.threshold = split.threshold;
            parent.left = left_id as NodeId;
            parent.right = right_id as NodeId;
            tree.impurity_decrease[split.feature] += split.gain;

            stack.push(PendingNode { id: right_id, rows: right_rows, depth: node.depth + 1 });
            stack.push(PendingNode { id: left_id, rows: left_rows, depth: node.depth + 1 });
        }

        tree
    }

    /// Traverse from the root to a leaf.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return node.value;
            }
            idx = if row[node.feature as usize] <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Impurity-based importances normalised to sum to 1 (all zero for a
    /// single-leaf tree).
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.impurity_decrease.len()];
        }
        self.impurity_decrease.iter().map(|v| v / total).collect()
    }
}

fn mean(target: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| target[r]).sum::<f64>() / rows.len() as f64
}

/// Exhaustive search over the candidate features for the split with the
/// largest squared-error reduction.
fn best_split(
    x: &FeatureMatrix,
    rows: &[usize],
    candidates: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = rows.len();
    let total_sum: f64 = rows.iter().map(|&r| x.target[r]).sum();
    let total_sq: f64 = rows.iter().map(|&r| x.target[r] * x.target[r]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;
    if parent_sse <= f64::EPSILON * total_sq.max(1.0) {
        return None;
    }

    let min_leaf = min_samples_leaf.max(1);
    let mut best: Option<Split> = None;
    let mut order: Vec<(f64, f64)> = Vec::with_capacity(n);

    for &feature in candidates {
        order.clear();
        order.extend(rows.iter().map(|&r| (x.get(r, feature), x.target[r])));
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 1..n {
            let (prev_value, prev_target) = order[i - 1];
            left_sum += prev_target;
            left_sq += prev_target * prev_target;

            if prev_value >= order[i].0 || i < min_leaf || n - i < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let children_sse = (left_sq - left_sum * left_sum / i as f64)
                + (right_sq - right_sum * right_sum / (n - i) as f64);
            let gain = parent_sse - children_sse;

            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold: prev_value + (order[i].0 - prev_value) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: usize::MAX,
        }
    }

    fn matrix(rows: &[[f64; 2]], target: &[f64]) -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            rows.iter().flatten().copied().collect(),
            target.to_vec(),
        )
    }

    #[test]
    fn step_function_is_learned_exactly() {
        let x = matrix(
            &[[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0]],
            &[5.0, 5.0, 5.0, 9.0, 9.0],
        );
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, (0..5).collect(), &params(), &mut rng);

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_relative_eq!(tree.nodes[0].threshold, 6.5);
        assert_relative_eq!(tree.predict_row(&[2.5, 0.0]), 5.0);
        assert_relative_eq!(tree.predict_row(&[100.0, 0.0]), 9.0);
        assert_eq!(tree.feature_importances(), vec![1.0, 0.0]);
    }

    #[test]
    fn constant_target_stays_a_leaf() {
        let x = matrix(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], &[7.0, 7.0, 7.0]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, vec![0, 1, 2], &params(), &mut rng);

        assert_eq!(tree.nodes.len(), 1);
        assert_relative_eq!(tree.predict_row(&[0.0, 0.0]), 7.0);
        assert_eq!(tree.feature_importances(), vec![0.0, 0.0]);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = matrix(
            &[[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]],
            &[1.0, 2.0, 3.0, 4.0],
        );
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let shallow = TreeParams { max_depth: Some(1), ..params() };
        let tree = RegressionTree::fit(&x, (0..4).collect(), &shallow, &mut rng);

        assert_eq!(tree.n_leaves(), 2);
        assert_relative_eq!(tree.predict_row(&[1.0, 0.0]), 1.5);
        assert_relative_eq!(tree.predict_row(&[4.0, 0.0]), 3.5);
    }

    #[test]
    fn repeated_rows_weigh_the_leaf_mean() {
        let x = matrix(&[[1.0, 0.0], [1.0, 0.0]], &[2.0, 4.0]);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, vec![0, 0, 0, 1], &params(), &mut rng);

        // identical feature values, no split possible
        assert_eq!(tree.nodes.len(), 1);
        assert_relative_eq!(tree.predict_row(&[1.0, 0.0]), 2.5);
    }
}
