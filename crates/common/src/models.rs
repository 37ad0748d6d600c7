//! The home sale record and its canonical Arrow schema.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Construction year column; the default partition key.
pub const DATE_BUILT: &str = "date_built";

/// One sale of one home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeSale {
    pub id: String,
    /// Sale date as `YYYY-MM-DD`
    pub date: String,
    pub date_built: i32,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub sqft_living: i32,
    pub sqft_lot: i32,
    pub floors: i32,
    pub waterfront: i32,
    pub view: i32,
}

impl HomeSale {
    pub const CSV_HEADER: &'static str =
        "id,date,date_built,price,bedrooms,bathrooms,sqft_living,sqft_lot,floors,waterfront,view";

    /// Render the record as one comma-delimited line in header order.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            self.id,
            self.date,
            self.date_built,
            self.price,
            self.bedrooms,
            self.bathrooms,
            self.sqft_living,
            self.sqft_lot,
            self.floors,
            self.waterfront,
            self.view
        )
    }

    /// Render a header plus one line per record.
    pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a HomeSale>) -> String {
        let mut out = String::from(Self::CSV_HEADER);
        out.push('\n');
        for record in records {
            out.push_str(&record.to_csv_row());
            out.push('\n');
        }
        out
    }
}

/// Arrow schema of the home sales dataset.
pub fn home_sales_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("date", DataType::Date32, true),
        Field::new(DATE_BUILT, DataType::Int32, true),
        Field::new("price", DataType::Int64, true),
        Field::new("bedrooms", DataType::Int32, true),
        Field::new("bathrooms", DataType::Int32, true),
        Field::new("sqft_living", DataType::Int32, true),
        Field::new("sqft_lot", DataType::Int32, true),
        Field::new("floors", DataType::Int32, true),
        Field::new("waterfront", DataType::Int32, true),
        Field::new("view", DataType::Int32, true),
    ]))
}

pub fn column_names() -> Vec<String> {
    home_sales_schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matches_schema() {
        let header: Vec<&str> = HomeSale::CSV_HEADER.split(',').collect();
        assert_eq!(header, column_names());
    }

    #[test]
    fn test_to_csv_row() {
        let sale = HomeSale {
            id: "f8a53099".to_string(),
            date: "2022-04-08".to_string(),
            date_built: 2016,
            price: 936923,
            bedrooms: 4,
            bathrooms: 3,
            sqft_living: 3167,
            sqft_lot: 11733,
            floors: 2,
            waterfront: 1,
            view: 76,
        };

        assert_eq!(
            sale.to_csv_row(),
            "f8a53099,2022-04-08,2016,936923,4,3,3167,11733,2,1,76"
        );
        let csv = HomeSale::to_csv([&sale]);
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.starts_with("id,date,"));
    }
}
