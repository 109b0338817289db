//! Console tables, rendered with Arrow's pretty printer.

use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::explore::ColumnSummary;
use crate::data::model::{FieldValue, ListingTable};
use crate::features::encode::FeatureMatrix;

fn render(columns: Vec<(String, ArrayRef)>) -> Result<String> {
    let batch = RecordBatch::try_from_iter(columns)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

fn round(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

fn floats(values: impl IntoIterator<Item = f64>, decimals: i32) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(
        values.into_iter().map(|v| round(v, decimals)),
    ))
}

/// The first `n` listings, one Arrow column per table column.
pub fn listing_head(table: &ListingTable, n: usize) -> Result<String> {
    let rows = &table.rows[..n.min(table.len())];
    let columns = table
        .column_names
        .iter()
        .map(|col| {
            let cells: Vec<Option<&FieldValue>> = rows
                .iter()
                .map(|r| r.get(col).filter(|v| !v.is_null()))
                .collect();
            let all_int = cells.iter().flatten().all(|v| matches!(v, FieldValue::Integer(_)));
            let all_num = cells
                .iter()
                .flatten()
                .all(|v| matches!(v, FieldValue::Integer(_) | FieldValue::Float(_)));
            let array: ArrayRef = if all_int {
                Arc::new(Int64Array::from(
                    cells.iter().map(|c| c.and_then(FieldValue::as_i64)).collect::<Vec<_>>(),
                ))
            } else if all_num {
                Arc::new(Float64Array::from(
                    cells.iter().map(|c| c.and_then(FieldValue::as_f64)).collect::<Vec<_>>(),
                ))
            } else {
                Arc::new(
                    cells
                        .iter()
                        .map(|c| c.map(|v| v.to_string()))
                        .collect::<StringArray>(),
                )
            };
            (col.clone(), array)
        })
        .collect();
    render(columns)
}

/// The first `n` encoded rows with their target.
pub fn matrix_head(matrix: &FeatureMatrix, target: &str, n: usize) -> Result<String> {
    let rows = n.min(matrix.n_rows);
    let mut columns = vec![(
        target.to_string(),
        floats(matrix.target[..rows].iter().copied(), 2),
    )];
    for (c, name) in matrix.names.iter().enumerate() {
        columns.push((name.clone(), floats((0..rows).map(|r| matrix.get(r, c)), 2)));
    }
    render(columns)
}

/// `describe()`-style statistics: one row per statistic, one column per
/// numeric field.
pub fn summary(summaries: &[ColumnSummary]) -> Result<String> {
    let mut columns: Vec<(String, ArrayRef)> = vec![(
        "statistic".to_string(),
        Arc::new(StringArray::from(ColumnSummary::LABELS.to_vec())),
    )];
    for s in summaries {
        columns.push((s.column.clone(), floats(s.values(), 4)));
    }
    render(columns)
}

pub fn missing(counts: &[(String, usize)]) -> Result<String> {
    render(vec![
        (
            "column".to_string(),
            Arc::new(StringArray::from_iter_values(counts.iter().map(|(c, _)| c.as_str()))),
        ),
        (
            "missing".to_string(),
            Arc::new(UInt64Array::from_iter_values(counts.iter().map(|(_, n)| *n as u64))),
        ),
    ])
}

pub fn importances(ranked: &[(String, f64)], n: usize) -> Result<String> {
    let shown = &ranked[..n.min(ranked.len())];
    render(vec![
        (
            "feature".to_string(),
            Arc::new(StringArray::from_iter_values(shown.iter().map(|(f, _)| f.as_str()))),
        ),
        ("importance".to_string(), floats(shown.iter().map(|(_, v)| *v), 6)),
    ])
}

/// Actual vs predicted prices with their difference, rounded to 2 decimals.
pub fn comparison(actual: &[f64], predicted: &[f64]) -> Result<String> {
    render(vec![
        ("Actual_Price".to_string(), floats(actual.iter().copied(), 2)),
        ("Predicted_Price".to_string(), floats(predicted.iter().copied(), 2)),
        (
            "Difference".to_string(),
            floats(actual.iter().zip(predicted).map(|(a, p)| a - p), 2),
        ),
    ])
}
