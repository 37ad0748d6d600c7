//! Dataset sources.
//!
//! Each source knows how to turn a location on disk into a DataFusion
//! `TableProvider`. The engine owns registration, so replacing a view and
//! invalidating its cache entry happen in one place.
//!
//! | Kind      | Implementation  | Description |
//! |-----------|-----------------|-------------|
//! | `csv`     | `CsvSource`     | Delimited text, explicit or inferred schema |
//! | `parquet` | `ParquetSource` | Parquet tree with Hive-style partition directories |

use anyhow::Result;
use async_trait::async_trait;
use datafusion::catalog::TableProvider;
use datafusion::prelude::SessionContext;
use std::sync::Arc;

pub mod file;

pub use file::{CsvSource, ParquetSource};

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Short format name used in logs and error context (e.g. "csv")
    fn kind(&self) -> &'static str;

    /// Path or URL the source reads from
    fn location(&self) -> &str;

    /// Builds the table provider backing a view over this source
    async fn table_provider(&self, context: &SessionContext) -> Result<Arc<dyn TableProvider>>;
}
