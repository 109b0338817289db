//! Model layer: train/test splitting, the random-forest regressor, and
//! regression metrics.
//!
//! ```text
//!   FeatureMatrix ──split──▶ train / test
//!        train ──RandomForest::fit──▶ forest (RegressionTree × n)
//!        test  ──forest.predict──▶ predictions ──metrics──▶ R² / RMSE / MAE
//! ```

pub mod forest;
pub mod metrics;
pub mod split;
pub mod tree;

/// Errors raised while splitting data or fitting the forest.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,
    #[error("feature vector has {got} columns, the model expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },
}
