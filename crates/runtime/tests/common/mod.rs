#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use homesales_common::config::AppConfig;
use homesales_runtime::engine::AnalysisEngine;
use tempfile::TempDir;

pub const FIXTURE_ROWS: usize = 12;

/// Fixture dataset copied into a scratch directory, with the partitioned
/// output in a subdirectory of it.
pub struct Workspace {
    pub dir: TempDir,
    pub config: AppConfig,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("home_sales.csv");
        Self::with_csv(&std::fs::read_to_string(fixture)?)
    }

    pub fn with_csv(contents: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let csv_path = dir.path().join("home_sales.csv");
        std::fs::write(&csv_path, contents)?;

        let mut config = AppConfig::default();
        config.dataset.path = Some(csv_path.to_string_lossy().to_string());
        config.partition.output_dir = dir
            .path()
            .join("home_sales_partitioned")
            .to_string_lossy()
            .to_string();
        Ok(Self { dir, config })
    }

    pub fn engine(&self) -> Result<AnalysisEngine> {
        AnalysisEngine::new(&self.config.engine)
    }

    /// Engine with the CSV registered under the configured view name.
    pub async fn loaded_engine(&self) -> Result<AnalysisEngine> {
        let engine = self.engine()?;
        engine.register_home_sales(&self.config.dataset).await?;
        Ok(engine)
    }
}
