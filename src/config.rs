use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::forest::ForestParams;

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "CAR_PRICE_CONFIG";

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Every tunable of a pipeline run. Missing JSON fields keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Listing file to load.
    pub data_path: PathBuf,
    /// Directory receiving the PNG charts.
    pub output_dir: PathBuf,
    /// Year `Car_Age` is measured against.
    pub reference_year: i64,
    /// Fraction of rows held out for testing.
    pub test_size: f64,
    pub split_seed: u64,
    pub forest: ForestParams,
    pub head_rows: usize,
    pub top_features_printed: usize,
    pub top_features_plotted: usize,
    pub comparison_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("sales.csv"),
            output_dir: PathBuf::from("."),
            reference_year: 2025,
            test_size: 0.2,
            split_seed: 42,
            forest: ForestParams::default(),
            head_rows: 5,
            top_features_printed: 10,
            top_features_plotted: 15,
            comparison_rows: 10,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Defaults, overlaid by the JSON file at `config_path` (if any), with
    /// `data_path` taking precedence over both.
    pub fn resolve(config_path: Option<&Path>, data_path: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                log::info!("Reading configuration from {}", path.display());
                Self::from_json_file(path)?
            }
            None => Self::default(),
        };
        if let Some(path) = data_path {
            config.data_path = path;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::model::forest::MaxFeatures;

    #[test]
    fn defaults_match_the_reference_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_path, PathBuf::from("sales.csv"));
        assert_eq!(config.reference_year, 2025);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.split_seed, 42);
        assert_eq!(config.forest.n_estimators, 100);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.forest.max_features, MaxFeatures::All);
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"reference_year": 2030, "forest": {{"n_estimators": 7, "max_features": "sqrt"}}}}"#
        )
        .unwrap();

        let config = PipelineConfig::resolve(Some(file.path()), Some("cars.parquet".into())).unwrap();
        assert_eq!(config.reference_year, 2030);
        assert_eq!(config.forest.n_estimators, 7);
        assert_eq!(config.forest.max_features, MaxFeatures::Sqrt);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.data_path, PathBuf::from("cars.parquet"));
    }

    #[test]
    fn unreadable_config_is_an_error() {
        assert!(PipelineConfig::resolve(Some(Path::new("/nonexistent/config.json")), None).is_err());
    }
}
