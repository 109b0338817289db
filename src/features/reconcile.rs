use std::collections::BTreeMap;

use crate::data::model::{FieldValue, Listing};

use super::FeatureError;
use super::derive::derive_listing;
use super::encode::{FeatureSchema, FeatureVector, SchemaColumn, indicator_name};

/// Align an arbitrary record with the training schema.
///
/// Raw `Year` / `Car_Name` fields are derived exactly as during training.
/// Every text field then becomes a `<field>_<value>` indicator set to 1.
/// Schema columns the record does not produce are zero, numeric ones
/// included, and anything the schema does not know is dropped, so the output
/// always has the schema's columns in the schema's order. Text in a numeric
/// field expands to an indicator like any other text, which leaves the
/// numeric column itself at zero.
///
/// Unknown categories and renamed fields are masked rather than reported;
/// they only show up in the debug log.
pub fn reconcile(
    schema: &FeatureSchema,
    record: &Listing,
    reference_year: i64,
) -> Result<FeatureVector, FeatureError> {
    let mut record = record.clone();
    derive_listing(&mut record, reference_year)?;

    let expanded = expand(&record);

    let values: Vec<f64> = schema
        .columns()
        .iter()
        .map(|col| match expanded.get(&col.name()) {
            Some(v) => *v,
            None => {
                if let SchemaColumn::Numeric(name) = col {
                    log::debug!("Filling numeric column {name} with 0: absent from the record");
                }
                0.0
            }
        })
        .collect();

    for name in expanded.keys() {
        if !schema.names().contains(name) {
            log::debug!("Dropping column {name}: not part of the training schema");
        }
    }

    Ok(FeatureVector {
        names: schema.names().to_vec(),
        values,
    })
}

/// `get_dummies` over a single record: text fields expand to indicators of
/// every value (no reference level), numeric fields keep their name.
fn expand(record: &Listing) -> BTreeMap<String, f64> {
    record
        .iter()
        .filter_map(|(field, value)| match value {
            FieldValue::String(category) => Some((indicator_name(field, category), 1.0)),
            other => other.as_f64().map(|v| (field.clone(), v)),
        })
        .collect()
}
