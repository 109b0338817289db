use crate::data::model::{CAR_NAME, FieldValue, Listing, ListingTable, YEAR};

use super::FeatureError;

pub const CAR_AGE: &str = "Car_Age";
pub const BRAND: &str = "Brand";

/// Age of a car in years relative to `reference_year`.
pub fn car_age(year: i64, reference_year: i64) -> i64 {
    reference_year - year
}

/// The brand is the first whitespace-separated token of the compound name.
pub fn brand(car_name: &str) -> Result<String, FeatureError> {
    car_name
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(FeatureError::EmptyName)
}

/// Replace `Year` by `Car_Age` and `Car_Name` by `Brand` in a single record.
/// Records already carrying the derived fields pass through untouched.
pub fn derive_listing(row: &mut Listing, reference_year: i64) -> Result<(), FeatureError> {
    if let Some(year) = row.remove(YEAR) {
        let age = match &year {
            FieldValue::Null => FieldValue::Null,
            other => {
                let year = other
                    .as_i64()
                    .ok_or_else(|| FeatureError::InvalidYear(other.to_string()))?;
                FieldValue::Integer(car_age(year, reference_year))
            }
        };
        row.insert(CAR_AGE.to_string(), age);
    }

    if let Some(name) = row.remove(CAR_NAME) {
        let brand = match &name {
            FieldValue::String(s) => brand(s)?,
            FieldValue::Null => return Err(FeatureError::EmptyName),
            other => other.to_string(),
        };
        row.insert(BRAND.to_string(), FieldValue::String(brand));
    }

    Ok(())
}

/// Derive `Car_Age` and `Brand` for every listing. The source columns are
/// dropped and the derived ones appended to the column order.
pub fn derive_table(table: &ListingTable, reference_year: i64) -> Result<ListingTable, FeatureError> {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            derive_listing(&mut row, reference_year)?;
            Ok(row)
        })
        .collect::<Result<Vec<_>, FeatureError>>()?;

    let mut column_names: Vec<String> = table
        .column_names
        .iter()
        .filter(|c| c.as_str() != YEAR && c.as_str() != CAR_NAME)
        .cloned()
        .collect();
    if table.has_column(YEAR) {
        column_names.push(CAR_AGE.to_string());
    }
    if table.has_column(CAR_NAME) {
        column_names.push(BRAND.to_string());
    }

    log::debug!("Derived {CAR_AGE} and {BRAND} for {} listings", rows.len());
    Ok(ListingTable::from_rows(column_names, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(pairs: &[(&str, FieldValue)]) -> Listing {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn brand_takes_first_token() {
        assert_eq!(brand("maruti swift dzire").unwrap(), "maruti");
        assert_eq!(brand("  Honda  city").unwrap(), "Honda");
        assert!(matches!(brand("   "), Err(FeatureError::EmptyName)));
    }

    #[test]
    fn raw_fields_are_replaced() {
        let mut row = listing(&[
            (YEAR, 2014i64.into()),
            (CAR_NAME, "ritz".into()),
            ("Owner", 0i64.into()),
        ]);
        derive_listing(&mut row, 2025).unwrap();

        assert_eq!(row[CAR_AGE], FieldValue::Integer(11));
        assert_eq!(row[BRAND], FieldValue::from("ritz"));
        assert!(!row.contains_key(YEAR));
        assert!(!row.contains_key(CAR_NAME));
    }

    #[test]
    fn derived_fields_pass_through() {
        let mut row = listing(&[(CAR_AGE, 3i64.into())]);
        derive_listing(&mut row, 2025).unwrap();
        assert_eq!(row, listing(&[(CAR_AGE, 3i64.into())]));
    }

    #[test]
    fn fractional_year_is_rejected() {
        let mut row = listing(&[(YEAR, 2014.5.into())]);
        assert!(matches!(
            derive_listing(&mut row, 2025),
            Err(FeatureError::InvalidYear(_))
        ));
    }

    #[test]
    fn table_columns_move_to_the_end() {
        let table = ListingTable::from_rows(
            vec![CAR_NAME.into(), YEAR.into(), "Owner".into()],
            vec![listing(&[
                (CAR_NAME, "sx4".into()),
                (YEAR, 2013i64.into()),
                ("Owner", 0i64.into()),
            ])],
        );
        let derived = derive_table(&table, 2025).unwrap();
        assert_eq!(derived.column_names, vec!["Owner", CAR_AGE, BRAND]);
        assert_eq!(derived.rows[0][CAR_AGE], FieldValue::Integer(12));
    }
}
