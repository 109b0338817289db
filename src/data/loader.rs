use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{EXPECTED_COLUMNS, FieldValue, Listing, ListingTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listing table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one listing per line (the usual `sales.csv`)
/// * `.json`    – `[{ "Car_Name": "ritz", "Year": 2014, ... }, ...]`
/// * `.parquet` – flat columns as written by `df.to_parquet()`
pub fn load_file(path: &Path) -> Result<ListingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} listings with {} columns from {}",
        table.len(),
        table.column_names.len(),
        path.display()
    );
    Ok(table)
}

/// Fail unless every column the pipeline relies on is present.
pub fn ensure_columns(table: &ListingTable) -> Result<()> {
    let missing: Vec<&str> = EXPECTED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        bail!("Dataset is missing required columns: {}", missing.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other row one listing.
/// Cell types are guessed per cell.
fn load_csv(path: &Path) -> Result<ListingTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut row = Listing::new();
        for (col_idx, value) in record.iter().enumerate() {
            let col_name = headers
                .get(col_idx)
                .with_context(|| format!("CSV row {row_no}: more fields than headers"))?;
            row.insert(col_name.clone(), guess_field_type(value.trim()));
        }

        rows.push(row);
    }

    Ok(ListingTable::from_rows(headers, rows))
}

fn guess_field_type(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => FieldValue::Bool(true),
        "false" | "False" | "FALSE" => FieldValue::Bool(false),
        _ => FieldValue::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Car_Name": "ritz", "Year": 2014, "Selling_Price": 3.35, ... },
///   ...
/// ]
/// ```
///
/// JSON objects carry no reliable key order, so known listing columns come
/// first in their canonical order and any others follow alphabetically.
fn load_json(path: &Path) -> Result<ListingTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let row: Listing = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_field(val)))
            .collect();
        rows.push(row);
    }

    let column_names = EXPECTED_COLUMNS
        .iter()
        .filter(|c| rows.iter().any(|r| r.contains_key(**c)))
        .map(|c| c.to_string())
        .collect();

    Ok(ListingTable::from_rows(column_names, rows))
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one listing per row.
///
/// Any flat column of strings, ints, floats or bools is read; nested types
/// are stringified by their Arrow type name.
fn load_parquet(path: &Path) -> Result<ListingTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row_idx in 0..batch.num_rows() {
            let mut row = BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_field_value(batch.column(col_idx), row_idx);
                row.insert(field.name().clone(), value);
            }
            rows.push(row);
        }
    }

    Ok(ListingTable::from_rows(column_names, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| FieldValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => Some(FieldValue::String(
            col.as_string::<i64>().value(row).to_string(),
        )),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|arr| FieldValue::Integer(arr.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|arr| FieldValue::Integer(arr.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|arr| FieldValue::Float(arr.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|arr| FieldValue::Float(arr.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|arr| FieldValue::Bool(arr.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| FieldValue::String(format!("{:?}", col.data_type())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const SAMPLE_CSV: &str = "\
Car_Name,Year,Selling_Price,Present_Price,Driven_kms,Fuel_Type,Selling_type,Transmission,Owner
ritz,2014,3.35,5.59,27000,Petrol,Dealer,Manual,0
sx4,2013,4.75,9.54,43000,Diesel,Dealer,Manual,0
city,,7.25,9.85,6900,Petrol,Dealer,Manual,0
";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_cells_are_typed() {
        let file = write_temp(".csv", SAMPLE_CSV);
        let table = load_file(file.path()).unwrap();

        assert_eq!(table.shape(), (3, 9));
        assert_eq!(table.column_names[0], "Car_Name");
        assert_eq!(table.rows[0]["Year"], FieldValue::Integer(2014));
        assert_eq!(table.rows[0]["Selling_Price"], FieldValue::Float(3.35));
        assert_eq!(table.rows[1]["Fuel_Type"], FieldValue::from("Diesel"));
        assert_eq!(table.rows[2]["Year"], FieldValue::Null);
        ensure_columns(&table).unwrap();
    }

    #[test]
    fn boolean_cells_accept_any_common_casing() {
        for (cell, expected) in [("true", true), ("True", true), ("FALSE", false), ("False", false)] {
            assert_eq!(guess_field_type(cell), FieldValue::Bool(expected), "{cell}");
        }
        assert_eq!(guess_field_type("tRuE"), FieldValue::from("tRuE"));
    }

    #[test]
    fn json_records_use_canonical_column_order() {
        let file = write_temp(
            ".json",
            r#"[{"Year": 2017, "Car_Name": "swift", "Extra": true, "Owner": 1}]"#,
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.column_names, vec!["Car_Name", "Year", "Owner", "Extra"]);
        assert_eq!(table.rows[0]["Extra"], FieldValue::Bool(true));
    }

    #[test]
    fn parquet_flat_columns_are_read() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Car_Name", DataType::Utf8, false),
            Field::new("Year", DataType::Int64, true),
            Field::new("Selling_Price", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["ritz", "ciaz"])),
                Arc::new(Int64Array::from(vec![Some(2014), None])),
                Arc::new(Float64Array::from(vec![3.35, 7.5])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.column_names, vec!["Car_Name", "Year", "Selling_Price"]);
        assert_eq!(table.rows[0]["Year"], FieldValue::Integer(2014));
        assert_eq!(table.rows[1]["Year"], FieldValue::Null);
        assert_eq!(table.rows[1]["Selling_Price"], FieldValue::Float(7.5));
    }

    #[test]
    fn missing_columns_are_reported() {
        let file = write_temp(".csv", "Car_Name,Year\nritz,2014\n");
        let table = load_file(file.path()).unwrap();
        let err = ensure_columns(&table).unwrap_err().to_string();
        assert!(err.contains("Selling_Price"));
        assert!(!err.contains("Car_Name"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".xlsx", "");
        assert!(load_file(file.path()).is_err());
    }
}
