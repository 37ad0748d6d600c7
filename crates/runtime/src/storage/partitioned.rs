//! Hive-style partitioned Parquet output.
//!
//! A view is written under `output_dir/<column>=<value>/`, one directory per
//! distinct value. The partition column lives only in the directory names, so
//! readers must declare it as a partition column to get it back.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use arrow::array::AsArray;
use arrow::datatypes::UInt64Type;
use datafusion::config::TableParquetOptions;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::prelude::SessionContext;
use homesales_common::config::PartitionSettings;
use homesales_error::{ErrorCode, ErrorContext, HomeSalesError};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionInfo {
    /// Raw value from the `column=value` directory name
    pub value: String,
    /// Parquet files inside the partition directory
    pub files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionWriteSummary {
    pub output_dir: String,
    pub column: String,
    pub rows_written: u64,
    pub partitions: Vec<PartitionInfo>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PartitionWriteSummary {
    pub fn file_count(&self) -> usize {
        self.partitions.iter().map(|p| p.files).sum()
    }
}

/// Write `view` as Parquet partitioned by `settings.column`.
pub async fn write_partitioned(
    context: &SessionContext,
    view: &str,
    settings: &PartitionSettings,
) -> Result<PartitionWriteSummary> {
    let df = context.table(view).await.map_err(HomeSalesError::from)?;

    let columns: Vec<String> = df
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    if !columns.contains(&settings.column) {
        return Err(HomeSalesError::new(
            ErrorCode::PartitionColumnMissing,
            format!(
                "Partition column '{}' is not a column of view '{}'",
                settings.column, view
            ),
        )
        .with_context(ErrorContext::Partition {
            column: settings.column.clone(),
            output_dir: settings.output_dir.clone(),
            available_columns: columns,
        })
        .into());
    }

    prepare_output_dir(&settings.output_dir, &settings.column, settings.overwrite).await?;

    let mut writer_options = TableParquetOptions::default();
    if let Some(codec) = &settings.compression {
        writer_options.global.compression = Some(codec.clone());
    }
    let write_options =
        DataFrameWriteOptions::new().with_partition_by(vec![settings.column.clone()]);

    // Trailing separator makes the engine treat the target as a directory
    let target = format!("{}/", settings.output_dir.trim_end_matches('/'));

    let start = Instant::now();
    let result = df
        .write_parquet(&target, write_options, Some(writer_options))
        .await
        .map_err(|e| write_failed(settings, e))?;
    let elapsed = start.elapsed();

    let rows_written = result
        .first()
        .filter(|b| b.num_columns() > 0 && b.num_rows() > 0)
        .and_then(|b| b.column(0).as_primitive_opt::<UInt64Type>())
        .map(|counts| counts.value(0))
        .unwrap_or_default();

    let partitions = scan_partitions(&settings.output_dir, &settings.column).await?;

    info!(
        target: "storage",
        view,
        output_dir = %settings.output_dir,
        column = %settings.column,
        rows = rows_written,
        partitions = partitions.len(),
        duration_ms = elapsed.as_millis() as u64,
        "Wrote partitioned parquet"
    );

    Ok(PartitionWriteSummary {
        output_dir: settings.output_dir.clone(),
        column: settings.column.clone(),
        rows_written,
        partitions,
        elapsed,
    })
}

/// List the `column=value` directories under `dir` with their Parquet file counts.
///
/// Numeric values sort numerically, everything else lexically.
pub async fn scan_partitions(dir: &str, column: &str) -> Result<Vec<PartitionInfo>> {
    let prefix = format!("{}=", column);
    let mut partitions = Vec::new();

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| HomeSalesError::storage_io(&e))?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(value) = name.strip_prefix(&prefix) else {
            continue;
        };
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        partitions.push(PartitionInfo {
            value: value.to_string(),
            files: count_parquet_files(&entry.path()).await?,
        });
    }

    partitions.sort_by(|a, b| {
        match (a.value.parse::<i64>(), b.value.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.value.cmp(&b.value),
        }
    });
    Ok(partitions)
}

async fn count_parquet_files(dir: &Path) -> Result<usize> {
    let mut count = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.path().extension().and_then(|e| e.to_str()) == Some("parquet") {
            count += 1;
        }
    }
    Ok(count)
}

/// Make `dir` ready for a fresh write.
///
/// Only `<column>=<value>` directories from an earlier write are ever removed.
/// Anything else in `dir` makes it unusable as output, overwrite or not.
async fn prepare_output_dir(dir: &str, column: &str, overwrite: bool) -> Result<()> {
    let path = Path::new(dir);
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| HomeSalesError::storage_io(&e))?;
    if !exists {
        return Ok(());
    }

    let prefix = format!("{}=", column);
    let mut previous = vec![];
    let mut foreign = vec![];
    let mut entries = tokio::fs::read_dir(path)
        .await
        .map_err(|e| HomeSalesError::storage_io(&e))?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) && entry.file_type().await?.is_dir() {
            previous.push(entry.path());
        } else {
            foreign.push(name);
        }
    }

    if !foreign.is_empty() {
        foreign.sort();
        return Err(output_not_empty(
            dir,
            column,
            format!(
                "Output directory '{}' holds entries that are not '{}' partitions: {}",
                dir,
                column,
                foreign.join(", ")
            ),
        )
        .with_hint("Point partition.output_dir at a directory used only for partitioned output")
        .into());
    }

    if previous.is_empty() {
        return Ok(());
    }

    if !overwrite {
        return Err(output_not_empty(
            dir,
            column,
            format!("Output directory '{}' is not empty", dir),
        )
        .with_hint("Enable partition.overwrite or choose another partition.output_dir")
        .into());
    }

    debug!(
        target: "storage",
        output_dir = dir,
        partitions = previous.len(),
        "Removing previous partitions"
    );
    for partition in previous {
        tokio::fs::remove_dir_all(&partition)
            .await
            .map_err(|e| HomeSalesError::storage_io(&e))?;
    }
    Ok(())
}

fn output_not_empty(dir: &str, column: &str, message: String) -> HomeSalesError {
    HomeSalesError::new(ErrorCode::OutputNotEmpty, message).with_context(ErrorContext::Partition {
        column: column.to_string(),
        output_dir: dir.to_string(),
        available_columns: vec![],
    })
}

fn write_failed(settings: &PartitionSettings, err: datafusion::error::DataFusionError) -> anyhow::Error {
    HomeSalesError::new(
        ErrorCode::WriteFailed,
        format!(
            "Failed to write partitioned parquet to '{}': {}",
            settings.output_dir, err
        ),
    )
    .with_context(ErrorContext::Partition {
        column: settings.column.clone(),
        output_dir: settings.output_dir.clone(),
        available_columns: vec![],
    })
    .into()
}
