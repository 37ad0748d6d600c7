mod common;

use std::fs::File;

use anyhow::Result;
use homesales_error::{ErrorCode, HomeSalesError};
use homesales_runtime::query::catalog::AnalysisQuery;
use homesales_runtime::query::report::result_fingerprint;
use parquet::file::reader::{FileReader, SerializedFileReader};

use common::{Workspace, FIXTURE_ROWS};

fn parquet_files(dir: &std::path::Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = vec![];
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(parquet_files(&path)?);
        } else if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
            files.push(path);
        }
    }
    Ok(files)
}

#[tokio::test]
async fn test_one_directory_per_year() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    let settings = &workspace.config.partition;

    let summary = engine.write_partitioned("home_sales", settings).await?;
    assert_eq!(summary.rows_written, FIXTURE_ROWS as u64);
    assert_eq!(summary.partitions.len(), 3);
    assert!(summary.file_count() >= 3);

    let mut dirs: Vec<String> = std::fs::read_dir(&settings.output_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    dirs.sort();
    assert_eq!(
        dirs,
        vec!["date_built=2010", "date_built=2012", "date_built=2015"]
    );
    Ok(())
}

#[tokio::test]
async fn test_partition_column_not_stored_in_files() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    let settings = &workspace.config.partition;
    engine.write_partitioned("home_sales", settings).await?;

    let files = parquet_files(std::path::Path::new(&settings.output_dir))?;
    assert!(!files.is_empty());
    let mut rows = 0;
    for path in files {
        let reader = SerializedFileReader::new(File::open(&path)?)?;
        let metadata = reader.metadata();
        let columns: Vec<String> = metadata
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert!(!columns.contains(&"date_built".to_string()));
        assert!(columns.contains(&"price".to_string()));
        rows += metadata.file_metadata().num_rows();
    }
    assert_eq!(rows, FIXTURE_ROWS as i64);
    Ok(())
}

#[tokio::test]
async fn test_partitioned_view_matches_csv_view() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    let settings = &workspace.config.partition;

    engine.write_partitioned("home_sales", settings).await?;
    let schema = engine
        .register_partitioned_view("home_sales", settings)
        .await?;
    assert_eq!(
        schema.field_with_name("date_built")?.data_type(),
        &arrow::datatypes::DataType::Int32
    );
    assert_eq!(engine.count_rows("p_home_sales").await?, FIXTURE_ROWS);

    for query in AnalysisQuery::all() {
        let csv = engine.execute(&query.sql("home_sales")).await?;
        let parquet = engine.execute(&query.sql("p_home_sales")).await?;
        assert_eq!(
            result_fingerprint(&csv.batches)?,
            result_fingerprint(&parquet.batches)?,
            "{} differs on the partitioned view",
            query
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_overwrite_disabled_refuses_existing_output() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    let mut settings = workspace.config.partition.clone();

    engine.write_partitioned("home_sales", &settings).await?;
    // Overwriting replaces rather than appends
    let again = engine.write_partitioned("home_sales", &settings).await?;
    assert_eq!(again.partitions.len(), 3);
    assert_eq!(
        parquet_files(std::path::Path::new(&settings.output_dir))?.len(),
        again.file_count()
    );

    settings.overwrite = false;
    let err = engine
        .write_partitioned("home_sales", &settings)
        .await
        .unwrap_err();
    let hs = err.downcast_ref::<HomeSalesError>().unwrap();
    assert_eq!(hs.code, ErrorCode::OutputNotEmpty);
    Ok(())
}

#[tokio::test]
async fn test_unknown_partition_column() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    let mut settings = workspace.config.partition.clone();
    settings.column = "year_built".to_string();

    let err = engine
        .write_partitioned("home_sales", &settings)
        .await
        .unwrap_err();
    let hs = err.downcast_ref::<HomeSalesError>().unwrap();
    assert_eq!(hs.code, ErrorCode::PartitionColumnMissing);
    assert!(!std::path::Path::new(&settings.output_dir).exists());
    Ok(())
}

#[tokio::test]
async fn test_compressed_output() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    let mut settings = workspace.config.partition.clone();
    settings.compression = Some("snappy".to_string());

    let summary = engine.write_partitioned("home_sales", &settings).await?;
    assert_eq!(summary.rows_written, FIXTURE_ROWS as u64);
    engine
        .register_partitioned_view("home_sales", &settings)
        .await?;
    assert_eq!(engine.count_rows("p_home_sales").await?, FIXTURE_ROWS);
    Ok(())
}

#[tokio::test]
async fn test_output_dir_holding_dataset_is_refused() -> Result<()> {
    let workspace = Workspace::new()?;
    let engine = workspace.loaded_engine().await?;
    // Cached so the write could succeed without the CSV on disk
    engine.cache_view("home_sales").await?;

    let mut settings = workspace.config.partition.clone();
    settings.output_dir = workspace.dir.path().to_string_lossy().to_string();
    assert!(settings.overwrite);

    let err = engine
        .write_partitioned("home_sales", &settings)
        .await
        .unwrap_err();
    let hs = err.downcast_ref::<HomeSalesError>().unwrap();
    assert_eq!(hs.code, ErrorCode::OutputNotEmpty);
    assert!(workspace.dir.path().join("home_sales.csv").exists());
    assert_eq!(engine.count_rows("home_sales").await?, FIXTURE_ROWS);
    Ok(())
}
