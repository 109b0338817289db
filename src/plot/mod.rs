//! Static PNG charts.
//!
//! `canvas` maps data coordinates onto an `RgbImage` and draws primitives;
//! `charts` builds the three report figures on top of it.

pub mod canvas;
pub mod charts;

pub const DISTRIBUTION_FILE: &str = "selling_price_distribution.png";
pub const IMPORTANCE_FILE: &str = "feature_importance.png";
pub const ACTUAL_VS_PREDICTED_FILE: &str = "actual_vs_predicted.png";
