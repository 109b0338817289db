mod color;
mod config;
mod data;
mod features;
mod model;
mod pipeline;
mod plot;
mod report;

use std::path::PathBuf;

use config::{CONFIG_ENV, PipelineConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Usage: car-price [DATA_FILE]
    let data_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = PipelineConfig::resolve(config_path.as_deref(), data_path)?;

    let summary = pipeline::run(&config)?;
    log::info!(
        "Trained on {} rows with {} features, tested on {} rows (R² {:.3}); example car {:.2} lakhs",
        summary.n_train,
        summary.model.schema.len(),
        summary.n_test,
        summary.evaluation.r2,
        summary.example_prediction
    );
    Ok(())
}
