//! Random forest regressor: bagged CART trees averaged at prediction time.

use rand::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::Deserialize;

use super::ModelError;
use super::tree::{RegressionTree, TreeParams};
use crate::features::encode::{FeatureMatrix, FeatureVector};

/// How many features each split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Forest hyper-parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample per tree; otherwise every tree sees all rows.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fit `params.n_estimators` trees in parallel. Tree `i` draws its rows
    /// and feature order from an RNG seeded with `seed + i`, so the result
    /// does not depend on thread scheduling.
    pub fn fit(x: &FeatureMatrix, params: &ForestParams) -> Result<Self, ModelError> {
        if x.n_rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.n_cols == 0 {
            return Err(ModelError::InvalidParameter {
                name: "features",
                message: "feature matrix has no columns".to_string(),
            });
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidParameter {
                name: "n_estimators",
                message: "must be at least 1".to_string(),
            });
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
            max_features: params.max_features.resolve(x.n_cols),
        };

        let trees: Vec<RegressionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed.wrapping_add(i as u64));
                let rows: Vec<usize> = if params.bootstrap {
                    (0..x.n_rows).map(|_| rng.gen_range(0..x.n_rows)).collect()
                } else {
                    (0..x.n_rows).collect()
                };
                let tree = RegressionTree::fit(x, rows, &tree_params, &mut rng);
                log::debug!(
                    "tree {i}: {} leaves, depth {}",
                    tree.n_leaves(),
                    tree.depth()
                );
                tree
            })
            .collect();

        let feature_importances = average_importances(&trees, x.n_cols);
        log::info!(
            "Fitted {} trees on {} rows × {} features",
            trees.len(),
            x.n_rows,
            x.n_cols
        );

        Ok(Self {
            trees,
            n_features: x.n_cols,
            feature_importances,
        })
    }

    /// Mean prediction of all trees for one row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// Predict every row of a matrix.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        self.check_width(x.n_cols)?;
        Ok((0..x.n_rows)
            .into_par_iter()
            .map(|i| self.predict_row(x.row(i)))
            .collect())
    }

    /// Predict a single aligned feature vector.
    pub fn predict_vector(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        self.check_width(vector.values.len())?;
        Ok(self.predict_row(&vector.values))
    }

    /// Mean decrease in impurity per feature as `(name, importance)` pairs,
    /// sorted from most to least important. Importances sum to 1.
    pub fn ranked_importances(&self, names: &[String]) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = names
            .iter()
            .cloned()
            .zip(self.feature_importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    fn check_width(&self, got: usize) -> Result<(), ModelError> {
        if got != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got,
            });
        }
        Ok(())
    }
}

fn average_importances(trees: &[RegressionTree], n_features: usize) -> Vec<f64> {
    let mut sum = vec![0.0; n_features];
    for tree in trees {
        for (acc, v) in sum.iter_mut().zip(tree.feature_importances()) {
            *acc += v;
        }
    }
    let total: f64 = sum.iter().sum();
    if total > 0.0 {
        sum.iter_mut().for_each(|v| *v /= total);
    }
    sum
}
