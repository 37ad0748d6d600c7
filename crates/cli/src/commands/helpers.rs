//! Shared helpers and result types for CLI commands.
//!
//! # Components
//! - **Utilities**: `loaded_engine` (engine with the dataset view registered),
//!   `heading`, `print_table`.
//! - **Result Types**: Serializable structs used by commands for machine-readable
//!   (JSON/YAML) output.

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use homesales_common::config::AppConfig;
use homesales_runtime::engine::AnalysisEngine;
use homesales_runtime::query::report::{format_table, JsonRow};
use homesales_runtime::storage::PartitionWriteSummary;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Build the engine and register the configured dataset under its view name.
pub async fn loaded_engine(config: &AppConfig) -> Result<AnalysisEngine> {
    let engine = AnalysisEngine::new(&config.engine)?;
    engine.register_home_sales(&config.dataset).await?;
    Ok(engine)
}

pub fn heading(text: &str) {
    println!("\n{}", text.bold().cyan());
}

pub fn print_table(batches: &[RecordBatch]) -> Result<()> {
    println!("{}", format_table(batches)?);
    Ok(())
}

pub fn seconds(elapsed: std::time::Duration) -> String {
    format!("{:.4}s", elapsed.as_secs_f64())
}

// ===== Result Types =====

#[derive(Serialize)]
pub struct QueryCommandResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sql: String,
    pub row_count: usize,
    pub elapsed_seconds: f64,
    pub cache_hit: bool,
    pub rows: Vec<JsonRow>,
}

#[derive(Serialize)]
pub struct PartitionCommandResult {
    pub summary: PartitionWriteSummary,
    pub view_name: String,
    pub view_rows: usize,
}

#[derive(Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Serialize)]
pub struct DescribeResult {
    pub view: String,
    pub path: String,
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Serialize)]
pub struct QueryInfo {
    pub number: usize,
    pub name: &'static str,
    pub title: &'static str,
    pub sql: String,
}

#[derive(Serialize)]
pub struct QueryList {
    pub queries: Vec<QueryInfo>,
}
