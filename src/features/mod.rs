//! Feature engineering: derived columns, indicator encoding, and the
//! inference-time alignment of new records to the training schema.

pub mod derive;
pub mod encode;
pub mod reconcile;

/// Errors raised while turning listings into feature vectors.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("field {field} is not numeric: {value}")]
    NotNumeric { field: String, value: String },
    #[error("car name is empty")]
    EmptyName,
    #[error("invalid model year: {0}")]
    InvalidYear(String),
}
