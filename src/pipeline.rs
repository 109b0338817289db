use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::data::explore::{describe, missing_counts};
use crate::data::loader::{ensure_columns, load_file};
use crate::data::model::{
    DRIVEN_KMS, FUEL_TYPE, FieldValue, Listing, OWNER, PRESENT_PRICE, SELLING_PRICE, SELLING_TYPE,
    TRANSMISSION,
};
use crate::features::derive::{CAR_AGE, derive_table};
use crate::features::encode::{CATEGORICAL_COLUMNS, FeatureSchema, encode_table};
use crate::features::reconcile::reconcile;
use crate::model::forest::RandomForest;
use crate::model::metrics::Evaluation;
use crate::model::split::train_test_split;
use crate::plot::{self, charts};
use crate::report;

// ---------------------------------------------------------------------------
// Trained model
// ---------------------------------------------------------------------------

/// A fitted forest together with the column contract it was trained on.
pub struct TrainedModel {
    pub schema: FeatureSchema,
    pub forest: RandomForest,
    pub reference_year: i64,
}

impl TrainedModel {
    /// Predict the selling price of one car given as a field map. The record
    /// may carry raw `Year`/`Car_Name` or the derived `Car_Age`/`Brand`.
    pub fn predict_car_price(&self, car: &Listing) -> Result<f64> {
        let vector = reconcile(&self.schema, car, self.reference_year)?;
        Ok(self.forest.predict_vector(&vector)?)
    }
}

/// The car used to demonstrate single-record inference.
pub fn example_car() -> Listing {
    [
        (PRESENT_PRICE, FieldValue::Float(10.0)),
        (DRIVEN_KMS, FieldValue::Integer(25000)),
        (FUEL_TYPE, FieldValue::from("Petrol")),
        (SELLING_TYPE, FieldValue::from("Dealer")),
        (TRANSMISSION, FieldValue::from("Manual")),
        (OWNER, FieldValue::Integer(0)),
        (CAR_AGE, FieldValue::Integer(3)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

// ---------------------------------------------------------------------------
// Pipeline run
// ---------------------------------------------------------------------------

/// What a run produced, besides its console output and charts.
pub struct RunSummary {
    pub model: TrainedModel,
    pub evaluation: Evaluation,
    pub n_train: usize,
    pub n_test: usize,
    pub example_prediction: f64,
}

/// Execute every step once: load, explore, derive, encode, split, train,
/// evaluate, chart, compare, and predict the example car.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    println!("Loading and exploring data...");
    let table = load_file(&config.data_path)?;
    ensure_columns(&table)?;

    let (rows, cols) = table.shape();
    println!("Dataset shape: ({rows}, {cols})");
    println!("\nFirst {} rows:", config.head_rows);
    println!("{}", report::listing_head(&table, config.head_rows)?);
    println!("\nSummary statistics:");
    println!("{}", report::summary(&describe(&table))?);
    println!("\nMissing values:");
    println!("{}", report::missing(&missing_counts(&table))?);

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    charts::distribution(
        &table.numeric_column(SELLING_PRICE),
        &config.output_dir.join(plot::DISTRIBUTION_FILE),
    )?;

    println!("\nPerforming data preprocessing...");
    let derived = derive_table(&table, config.reference_year)?;
    let schema = FeatureSchema::fit(&derived, SELLING_PRICE, &CATEGORICAL_COLUMNS)?;
    let encoded = encode_table(&derived, &schema, SELLING_PRICE)?;
    log::info!("Encoded {} rows into {} features", encoded.n_rows, encoded.n_cols);

    println!("\nProcessed dataframe head:");
    println!("{}", report::matrix_head(&encoded, SELLING_PRICE, config.head_rows)?);

    let split = train_test_split(encoded.n_rows, config.test_size, config.split_seed)?;
    let train = encoded.select(&split.train);
    let test = encoded.select(&split.test);
    println!("\nTraining set: {} samples", train.n_rows);
    println!("Test set: {} samples", test.n_rows);

    println!("\nTraining Random Forest model...");
    let forest = RandomForest::fit(&train, &config.forest)?;

    let predicted = forest.predict(&test)?;
    let evaluation = Evaluation::compute(&test.target, &predicted);
    println!("\nModel performance:");
    println!("R² Score: {:.3}", evaluation.r2);
    println!("Root Mean Squared Error: {:.3} lakhs", evaluation.rmse);
    println!("Mean Absolute Error: {:.3} lakhs", evaluation.mae);

    println!("\nAnalyzing feature importance...");
    let ranked = forest.ranked_importances(schema.names());
    println!("\nTop {} most important features:", config.top_features_printed);
    println!("{}", report::importances(&ranked, config.top_features_printed)?);

    charts::feature_importance(
        &ranked,
        config.top_features_plotted,
        &config.output_dir.join(plot::IMPORTANCE_FILE),
    )?;
    charts::actual_vs_predicted(
        &test.target,
        &predicted,
        &config.output_dir.join(plot::ACTUAL_VS_PREDICTED_FILE),
    )?;

    let shown = config.comparison_rows.min(test.n_rows);
    println!("\nExample predictions:");
    println!(
        "{}",
        report::comparison(&test.target[..shown], &predicted[..shown])?
    );

    let model = TrainedModel {
        schema,
        forest,
        reference_year: config.reference_year,
    };

    println!("\nPrediction for example car:");
    let example_prediction = model.predict_car_price(&example_car())?;
    println!("Predicted price: {example_prediction:.2} lakhs");

    println!("\nAnalysis complete!");

    Ok(RunSummary {
        model,
        evaluation,
        n_train: train.n_rows,
        n_test: test.n_rows,
        example_prediction,
    })
}
