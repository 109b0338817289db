use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Column names of the used-car listing file
// ---------------------------------------------------------------------------

pub const CAR_NAME: &str = "Car_Name";
pub const YEAR: &str = "Year";
pub const SELLING_PRICE: &str = "Selling_Price";
pub const PRESENT_PRICE: &str = "Present_Price";
pub const DRIVEN_KMS: &str = "Driven_kms";
pub const FUEL_TYPE: &str = "Fuel_Type";
pub const SELLING_TYPE: &str = "Selling_type";
pub const TRANSMISSION: &str = "Transmission";
pub const OWNER: &str = "Owner";

/// Columns every listing file must provide.
pub const EXPECTED_COLUMNS: [&str; 9] = [
    CAR_NAME,
    YEAR,
    SELLING_PRICE,
    PRESENT_PRICE,
    DRIVEN_KMS,
    FUEL_TYPE,
    SELLING_TYPE,
    TRANSMISSION,
    OWNER,
];

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a listing
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Category sets are kept in `BTreeSet`s downstream so `FieldValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put FieldValue in BTreeSet --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v:.2}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl FieldValue {
    /// Try to interpret the value as an `f64`. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view; floats are accepted only when they carry no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Listing – one row of the source table
// ---------------------------------------------------------------------------

/// A single car listing: column_name → value.
pub type Listing = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// ListingTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct ListingTable {
    /// All listings (rows).
    pub rows: Vec<Listing>,
    /// Column names in source order.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<FieldValue>>,
}

impl ListingTable {
    /// Build column indices from the loaded rows. `column_names` fixes the
    /// column order; columns only found in rows are appended sorted.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Listing>) -> Self {
        let mut column_names = column_names;
        let mut extra: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<FieldValue>> = BTreeMap::new();

        for row in &rows {
            for (col, val) in row {
                if !column_names.contains(col) {
                    extra.insert(col.clone());
                }
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        column_names.extend(extra);

        ListingTable {
            rows,
            column_names,
            unique_values,
        }
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `(rows, columns)`, like `DataFrame.shape`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.column_names.len())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// Whether every non-null value of a column is numeric.
    pub fn is_numeric(&self, column: &str) -> bool {
        self.unique_values
            .get(column)
            .map(|vals| {
                let mut non_null = vals.iter().filter(|v| !v.is_null()).peekable();
                non_null.peek().is_some()
                    && non_null.all(|v| matches!(v, FieldValue::Integer(_) | FieldValue::Float(_)))
            })
            .unwrap_or(false)
    }

    /// Numeric values of a column, skipping nulls and non-numeric cells.
    pub fn numeric_column(&self, column: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column).and_then(FieldValue::as_f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, FieldValue)]) -> Listing {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn from_rows_keeps_declared_order_and_appends_extras() {
        let rows = vec![
            row(&[("b", 1i64.into()), ("a", "x".into())]),
            row(&[("b", 2i64.into()), ("a", "y".into()), ("z", FieldValue::Null)]),
        ];
        let table = ListingTable::from_rows(vec!["b".into(), "a".into()], rows);
        assert_eq!(table.column_names, vec!["b", "a", "z"]);
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.unique_values["a"].len(), 2);
    }

    #[test]
    fn numeric_detection_ignores_nulls() {
        let rows = vec![
            row(&[("n", 1i64.into()), ("s", "x".into())]),
            row(&[("n", FieldValue::Null), ("s", "y".into())]),
            row(&[("n", 2.5.into()), ("s", "z".into())]),
        ];
        let table = ListingTable::from_rows(vec!["n".into(), "s".into()], rows);
        assert!(table.is_numeric("n"));
        assert!(!table.is_numeric("s"));
        assert_eq!(table.numeric_column("n"), vec![1.0, 2.5]);
    }

    #[test]
    fn value_ordering_groups_by_kind() {
        let mut vals = vec![
            FieldValue::from("b"),
            FieldValue::Null,
            FieldValue::from(3i64),
            FieldValue::from("a"),
        ];
        vals.sort();
        assert_eq!(
            vals,
            vec![
                FieldValue::Null,
                FieldValue::from(3i64),
                FieldValue::from("a"),
                FieldValue::from("b"),
            ]
        );
    }

    #[test]
    fn integer_view_rejects_fractions() {
        assert_eq!(FieldValue::Float(2014.0).as_i64(), Some(2014));
        assert_eq!(FieldValue::Float(2014.5).as_i64(), None);
        assert_eq!(FieldValue::from("2014").as_i64(), None);
    }
}
