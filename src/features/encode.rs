use std::fmt;

use crate::data::model::{FUEL_TYPE, FieldValue, Listing, ListingTable, SELLING_TYPE, TRANSMISSION};

use super::FeatureError;
use super::derive::BRAND;

/// Columns expanded into indicator columns, in expansion order.
pub const CATEGORICAL_COLUMNS: [&str; 4] = [FUEL_TYPE, SELLING_TYPE, TRANSMISSION, BRAND];

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// One column of the model's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaColumn {
    /// A numeric field copied through unchanged.
    Numeric(String),
    /// `1.0` when `source` equals `category`, else `0.0`.
    Indicator { source: String, category: String },
}

impl SchemaColumn {
    pub fn name(&self) -> String {
        match self {
            SchemaColumn::Numeric(name) => name.clone(),
            SchemaColumn::Indicator { source, category } => indicator_name(source, category),
        }
    }
}

impl fmt::Display for SchemaColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// `Fuel_Type` + `Petrol` → `Fuel_Type_Petrol`.
pub fn indicator_name(source: &str, category: &str) -> String {
    format!("{source}_{category}")
}

/// The exact set and order of columns the model is trained on.
///
/// Numeric columns come first in table order, then the indicator columns of
/// each categorical column. Within a categorical column, categories are
/// sorted and the first one is dropped as the reference level.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<SchemaColumn>,
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build the schema from the full (derived) table.
    pub fn fit(
        table: &ListingTable,
        target: &str,
        categorical: &[&str],
    ) -> Result<Self, FeatureError> {
        if !table.has_column(target) {
            return Err(FeatureError::MissingField(target.to_string()));
        }

        let mut columns: Vec<SchemaColumn> = table
            .column_names
            .iter()
            .filter(|c| c.as_str() != target && !categorical.contains(&c.as_str()))
            .map(|c| SchemaColumn::Numeric(c.clone()))
            .collect();

        for &source in categorical {
            let Some(values) = table.unique_values.get(source) else {
                return Err(FeatureError::MissingField(source.to_string()));
            };
            let categories = values
                .iter()
                .filter(|v| !v.is_null())
                .map(category_label)
                .skip(1);
            columns.extend(categories.map(|category| SchemaColumn::Indicator {
                source: source.to_string(),
                category,
            }));
        }

        Ok(Self::from_columns(columns))
    }

    pub fn from_columns(columns: Vec<SchemaColumn>) -> Self {
        let names = columns.iter().map(SchemaColumn::name).collect();
        Self { columns, names }
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Encode one derived listing with the training-time encoding.
    pub fn encode_row(&self, row: &Listing) -> Result<Vec<f64>, FeatureError> {
        self.columns
            .iter()
            .map(|col| match col {
                SchemaColumn::Numeric(name) => numeric_field(row, name),
                SchemaColumn::Indicator { source, category } => Ok(row
                    .get(source)
                    .filter(|v| !v.is_null())
                    .map_or(0.0, |v| indicator(&category_label(v) == category))),
            })
            .collect()
    }
}

/// The text a category contributes to its indicator column name.
pub fn category_label(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        FieldValue::Float(v) => v.to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn indicator(present: bool) -> f64 {
    if present { 1.0 } else { 0.0 }
}

pub(crate) fn numeric_field(row: &Listing, name: &str) -> Result<f64, FeatureError> {
    match row.get(name) {
        None | Some(FieldValue::Null) => Err(FeatureError::MissingField(name.to_string())),
        Some(value) => value.as_f64().ok_or_else(|| FeatureError::NotNumeric {
            field: name.to_string(),
            value: value.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Encoded data
// ---------------------------------------------------------------------------

/// Row-major feature matrix with its target vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub data: Vec<f64>,
    pub target: Vec<f64>,
    pub n_rows: usize,
    pub n_cols: usize,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, data: Vec<f64>, target: Vec<f64>) -> Self {
        let n_cols = names.len();
        let n_rows = target.len();
        debug_assert_eq!(data.len(), n_rows * n_cols);
        Self { names, data, target, n_rows, n_cols }
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    /// Gather the given rows (in the given order) into a new matrix.
    pub fn select(&self, indices: &[usize]) -> FeatureMatrix {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        let target = indices.iter().map(|&i| self.target[i]).collect();
        FeatureMatrix::new(self.names.clone(), data, target)
    }
}

/// Encode every listing of a derived table into a feature matrix.
pub fn encode_table(
    table: &ListingTable,
    schema: &FeatureSchema,
    target: &str,
) -> Result<FeatureMatrix, FeatureError> {
    let mut data = Vec::with_capacity(table.len() * schema.len());
    let mut targets = Vec::with_capacity(table.len());
    for row in &table.rows {
        data.extend(schema.encode_row(row)?);
        targets.push(numeric_field(row, target)?);
    }
    Ok(FeatureMatrix::new(schema.names().to_vec(), data, targets))
}

/// A single aligned input for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

#[cfg(test)]
impl FeatureVector {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive::CAR_AGE;

    fn listing(pairs: &[(&str, FieldValue)]) -> Listing {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn derived_table() -> ListingTable {
        let rows = vec![
            listing(&[
                ("Selling_Price", 3.35.into()),
                ("Present_Price", 5.59.into()),
                (FUEL_TYPE, "Petrol".into()),
                (TRANSMISSION, "Manual".into()),
                (CAR_AGE, 11i64.into()),
            ]),
            listing(&[
                ("Selling_Price", 4.75.into()),
                ("Present_Price", 9.54.into()),
                (FUEL_TYPE, "Diesel".into()),
                (TRANSMISSION, "Manual".into()),
                (CAR_AGE, 12i64.into()),
            ]),
            listing(&[
                ("Selling_Price", 2.85.into()),
                ("Present_Price", 4.15.into()),
                (FUEL_TYPE, "CNG".into()),
                (TRANSMISSION, "Automatic".into()),
                (CAR_AGE, 9i64.into()),
            ]),
        ];
        ListingTable::from_rows(
            vec![
                "Selling_Price".into(),
                "Present_Price".into(),
                FUEL_TYPE.into(),
                TRANSMISSION.into(),
                CAR_AGE.into(),
            ],
            rows,
        )
    }

    #[test]
    fn schema_drops_reference_category() {
        let table = derived_table();
        let schema = FeatureSchema::fit(&table, "Selling_Price", &[FUEL_TYPE, TRANSMISSION]).unwrap();
        assert_eq!(
            schema.names(),
            &[
                "Present_Price",
                "Car_Age",
                "Fuel_Type_Diesel",
                "Fuel_Type_Petrol",
                "Transmission_Manual",
            ]
        );
    }

    #[test]
    fn table_encoding_sets_indicators() {
        let table = derived_table();
        let schema = FeatureSchema::fit(&table, "Selling_Price", &[FUEL_TYPE, TRANSMISSION]).unwrap();
        let matrix = encode_table(&table, &schema, "Selling_Price").unwrap();

        assert_eq!((matrix.n_rows, matrix.n_cols), (3, 5));
        assert_eq!(matrix.row(0), &[5.59, 11.0, 0.0, 1.0, 1.0]);
        assert_eq!(matrix.row(2), &[4.15, 9.0, 0.0, 0.0, 0.0]);
        assert_eq!(matrix.target, vec![3.35, 4.75, 2.85]);

        let picked = matrix.select(&[2, 0]);
        assert_eq!(picked.row(0), matrix.row(2));
        assert_eq!(picked.target, vec![2.85, 3.35]);
    }

    #[test]
    fn missing_target_is_an_error() {
        let rows = vec![listing(&[("Present_Price", 5.59.into()), (FUEL_TYPE, "Petrol".into())])];
        let table = ListingTable::from_rows(vec!["Present_Price".into(), FUEL_TYPE.into()], rows);
        assert!(matches!(
            FeatureSchema::fit(&table, "Selling_Price", &[FUEL_TYPE]),
            Err(FeatureError::MissingField(_))
        ));
    }

    #[test]
    fn text_in_numeric_column_is_rejected() {
        let schema = FeatureSchema::from_columns(vec![SchemaColumn::Numeric("Owner".into())]);
        let row = listing(&[("Owner", "first".into())]);
        assert!(matches!(
            schema.encode_row(&row),
            Err(FeatureError::NotNumeric { .. })
        ));
    }
}
