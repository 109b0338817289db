use super::model::ListingTable;

// ---------------------------------------------------------------------------
// Summary statistics (the `df.describe()` view)
// ---------------------------------------------------------------------------

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    /// Number of non-null values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Row labels in the order `values()` returns them.
    pub const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    pub fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// Summarise every numeric column of the table, in column order.
pub fn describe(table: &ListingTable) -> Vec<ColumnSummary> {
    table
        .column_names
        .iter()
        .filter(|col| table.is_numeric(col))
        .map(|col| summarize(col, &table.numeric_column(col)))
        .collect()
}

/// Statistics of a slice of values. Empty input yields NaN everywhere.
pub fn summarize(column: &str, values: &[f64]) -> ColumnSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        sorted.iter().sum::<f64>() / count as f64
    };
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

/// Quantile of already-sorted data with linear interpolation between
/// closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Missing values
// ---------------------------------------------------------------------------

/// Per column, the number of rows holding a null or lacking the key entirely.
pub fn missing_counts(table: &ListingTable) -> Vec<(String, usize)> {
    table
        .column_names
        .iter()
        .map(|col| {
            let missing = table
                .rows
                .iter()
                .filter(|row| row.get(col).map_or(true, |v| v.is_null()))
                .count();
            (col.clone(), missing)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::model::{FieldValue, Listing};

    #[test]
    fn quantiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&sorted, 0.25), 1.75);
        assert_relative_eq!(quantile(&sorted, 0.5), 2.5);
        assert_relative_eq!(quantile(&sorted, 1.0), 4.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn summary_matches_known_values() {
        let s = summarize("x", &[4.0, 2.0, 8.0, 6.0]);
        assert_eq!(s.count, 4);
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.std, (20.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(s.min, 2.0);
        assert_relative_eq!(s.median, 5.0);
        assert_relative_eq!(s.max, 8.0);
    }

    #[test]
    fn describe_skips_text_and_counts_missing() {
        let rows: Vec<Listing> = vec![
            [("price", FieldValue::from(1.0)), ("name", FieldValue::from("a"))]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            [("price", FieldValue::Null), ("name", FieldValue::from("b"))]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            [("price", FieldValue::from(3.0))]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ];
        let table = ListingTable::from_rows(vec!["price".into(), "name".into()], rows);

        let summaries = describe(&table);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].column, "price");
        assert_eq!(summaries[0].count, 2);

        let missing = missing_counts(&table);
        assert_eq!(missing, vec![("price".to_string(), 1), ("name".to_string(), 1)]);
    }
}
