//! Regression metrics.
//!
//! Each metric compares predictions against actual targets of equal length.
//! Empty input scores 0.

/// A scalar regression metric.
pub trait Metric {
    fn compute(&self, actual: &[f64], predicted: &[f64]) -> f64;

    fn name(&self) -> &'static str;
}

// =============================================================================
// R² (coefficient of determination)
// =============================================================================

/// R²: 1 − SS_res / SS_tot.
///
/// A constant target has no variance to explain; it scores 1.0 when the
/// predictions are exact and 0.0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2;

impl Metric for R2 {
    fn compute(&self, actual: &[f64], predicted: &[f64]) -> f64 {
        if actual.is_empty() {
            return 0.0;
        }
        debug_assert_eq!(actual.len(), predicted.len());

        let mean = actual.iter().sum::<f64>() / actual.len() as f64;
        let ss_res: f64 = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).powi(2))
            .sum();
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}

// =============================================================================
// RMSE (Root Mean Squared Error)
// =============================================================================

/// Root Mean Squared Error: sqrt(mean((pred - actual)²))
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl Metric for Rmse {
    fn compute(&self, actual: &[f64], predicted: &[f64]) -> f64 {
        if actual.is_empty() {
            return 0.0;
        }
        let mse = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).powi(2))
            .sum::<f64>()
            / actual.len() as f64;
        mse.sqrt()
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

// =============================================================================
// MAE (Mean Absolute Error)
// =============================================================================

/// Mean Absolute Error: mean(|pred - actual|)
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl Metric for Mae {
    fn compute(&self, actual: &[f64], predicted: &[f64]) -> f64 {
        if actual.is_empty() {
            return 0.0;
        }
        actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).abs())
            .sum::<f64>()
            / actual.len() as f64
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

// =============================================================================
// Evaluation summary
// =============================================================================

/// The three test-set scores reported after training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl Evaluation {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        let score = |metric: &dyn Metric| {
            let value = metric.compute(actual, predicted);
            log::debug!("{} over {} rows: {value:.4}", metric.name(), actual.len());
            value
        };
        Self {
            r2: score(&R2),
            rmse: score(&Rmse),
            mae: score(&Mae),
        }
    }
}
