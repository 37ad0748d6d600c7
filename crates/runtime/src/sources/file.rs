//! File-based dataset sources (CSV, Parquet) backed by DataFusion's `ListingTable`.
use anyhow::Result;
use arrow::datatypes::{DataType, SchemaRef};
use async_trait::async_trait;
use datafusion::catalog::TableProvider;
use datafusion::datasource::file_format::csv::CsvFormat;
use datafusion::datasource::file_format::parquet::ParquetFormat;
use datafusion::datasource::listing::{
    ListingOptions, ListingTable, ListingTableConfig, ListingTableUrl,
};
use datafusion::prelude::SessionContext;
use homesales_common::config::DatasetSettings;
use homesales_common::models::home_sales_schema;
use homesales_error::{ErrorCode, ErrorContext, HomeSalesError};
use std::path::Path;
use std::sync::Arc;

use crate::sources::DatasetSource;

/// A delimited text file (or a directory of them).
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: String,
    has_header: bool,
    delimiter: u8,
    /// `None` lets the engine infer column types
    schema: Option<SchemaRef>,
}

impl CsvSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            has_header: true,
            delimiter: b',',
            schema: None,
        }
    }

    /// The home sales dataset as configured: canonical schema unless inference is requested.
    pub fn from_settings(settings: &DatasetSettings) -> std::result::Result<Self, HomeSalesError> {
        let path = settings.require_path()?;
        if !settings.delimiter.is_ascii() {
            return Err(HomeSalesError::new(
                ErrorCode::InvalidConfig,
                format!("Delimiter '{}' is not an ASCII character", settings.delimiter),
            )
            .with_context(ErrorContext::Config {
                file_path: None,
                field: Some("dataset.delimiter".to_string()),
            }));
        }
        let delimiter = settings.delimiter as u8;

        let source = Self::new(path)
            .with_header(settings.has_header)
            .with_delimiter(delimiter);
        Ok(if settings.infer_schema {
            source
        } else {
            source.with_schema(home_sales_schema())
        })
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[async_trait]
impl DatasetSource for CsvSource {
    fn kind(&self) -> &'static str {
        "csv"
    }

    fn location(&self) -> &str {
        &self.path
    }

    async fn table_provider(&self, context: &SessionContext) -> Result<Arc<dyn TableProvider>> {
        let is_dir = ensure_local_path(&self.path, self.kind()).await?;

        let file_format = CsvFormat::default()
            .with_has_header(self.has_header)
            .with_delimiter(self.delimiter);
        let listing_options = ListingOptions::new(Arc::new(file_format))
            .with_file_extension(file_extension(&self.path, is_dir, ".csv"));
        let table_url = ListingTableUrl::parse(&self.path)?;

        let resolved_schema = match &self.schema {
            Some(schema) => schema.clone(),
            None => listing_options
                .infer_schema(&context.state(), &table_url)
                .await
                .map_err(|e| unreadable(&self.path, self.kind(), e))?,
        };

        let config = ListingTableConfig::new(table_url)
            .with_listing_options(listing_options)
            .with_schema(resolved_schema);
        Ok(Arc::new(ListingTable::try_new(config)?))
    }
}

/// A Parquet directory tree, optionally laid out as `column=value/` partitions.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: String,
    partition_cols: Vec<(String, DataType)>,
}

impl ParquetSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            partition_cols: vec![],
        }
    }

    /// Declare a Hive partition column; its values come from directory names.
    pub fn with_partition_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.partition_cols.push((name.into(), data_type));
        self
    }
}

#[async_trait]
impl DatasetSource for ParquetSource {
    fn kind(&self) -> &'static str {
        "parquet"
    }

    fn location(&self) -> &str {
        &self.path
    }

    async fn table_provider(&self, context: &SessionContext) -> Result<Arc<dyn TableProvider>> {
        let is_dir = ensure_local_path(&self.path, self.kind()).await?;

        let listing_options = ListingOptions::new(Arc::new(ParquetFormat::default()))
            .with_file_extension(file_extension(&self.path, is_dir, ".parquet"))
            .with_table_partition_cols(self.partition_cols.clone());
        let table_url = ListingTableUrl::parse(&self.path)?;

        // File schema only; ListingTable appends the partition columns itself
        let file_schema = listing_options
            .infer_schema(&context.state(), &table_url)
            .await
            .map_err(|e| unreadable(&self.path, self.kind(), e))?;

        let config = ListingTableConfig::new(table_url)
            .with_listing_options(listing_options)
            .with_schema(file_schema);
        Ok(Arc::new(ListingTable::try_new(config)?))
    }
}

/// Fails with `DatasetNotFound` for local paths that do not exist.
/// Returns whether the path is a directory.
async fn ensure_local_path(path: &str, format: &str) -> Result<bool> {
    if path.contains("://") {
        return Ok(path.ends_with('/'));
    }
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(HomeSalesError::new(
            ErrorCode::DatasetNotFound,
            format!("Dataset '{}' does not exist", path),
        )
        .with_context(ErrorContext::Dataset {
            path: path.to_string(),
            format: format.to_string(),
        })
        .with_hint("Check dataset.path or pass --dataset")
        .into()),
        Err(e) => Err(HomeSalesError::from(e)
            .with_context(ErrorContext::Dataset {
                path: path.to_string(),
                format: format.to_string(),
            })
            .into()),
    }
}

// A single file is read whatever its extension; directories only contribute matching files
fn file_extension(path: &str, is_dir: bool, default_ext: &str) -> String {
    if is_dir {
        return default_ext.to_string();
    }
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

fn unreadable(path: &str, format: &str, err: datafusion::error::DataFusionError) -> anyhow::Error {
    HomeSalesError::new(
        ErrorCode::DatasetUnreadable,
        format!("Failed to read {} dataset '{}': {}", format, path, err),
    )
    .with_context(ErrorContext::Dataset {
        path: path.to_string(),
        format: format.to_string(),
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("data/sales.csv", false, ".csv"), ".csv");
        assert_eq!(file_extension("data/sales.txt", false, ".csv"), ".txt");
        assert_eq!(file_extension("data/sales", false, ".csv"), "");
        assert_eq!(file_extension("data/", true, ".parquet"), ".parquet");
    }

    #[tokio::test]
    async fn test_missing_dataset_is_reported() {
        let ctx = SessionContext::new();
        let err = CsvSource::new("/definitely/not/here.csv")
            .table_provider(&ctx)
            .await
            .unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::DatasetNotFound);
    }

    #[test]
    fn test_from_settings_requires_path() {
        let settings = DatasetSettings::default();
        let err = CsvSource::from_settings(&settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn test_from_settings_uses_canonical_schema() {
        let settings = DatasetSettings {
            path: Some("sales.csv".to_string()),
            delimiter: '|',
            ..Default::default()
        };
        let source = CsvSource::from_settings(&settings).unwrap();
        assert_eq!(source.delimiter, b'|');
        assert_eq!(source.schema.unwrap().fields().len(), 11);

        let inferred = CsvSource::from_settings(&DatasetSettings {
            infer_schema: true,
            ..settings
        })
        .unwrap();
        assert!(inferred.schema.is_none());
    }

    #[test]
    fn test_multibyte_delimiter_rejected() {
        let settings = DatasetSettings {
            path: Some("sales.csv".to_string()),
            delimiter: '§',
            ..Default::default()
        };
        let err = CsvSource::from_settings(&settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }
}
