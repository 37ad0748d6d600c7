//! homesales runtime: SQL analysis of home sales data on DataFusion.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐
//! │ Walkthrough │────▶│ AnalysisEngine│──── ViewCache (MemTable swap)
//! └─────────────┘     └──────┬────────┘
//!                            │
//!               ┌────────────┴────────────┐
//!               │ Sources (CSV, Parquet)  │──── Partitioned Parquet writer
//!               └─────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use homesales_common::config::AppConfig;
//! use homesales_runtime::engine::AnalysisEngine;
//! use homesales_runtime::walkthrough::Walkthrough;
//!
//! let config = AppConfig::from_file("homesales.yaml")?;
//! let engine = AnalysisEngine::new(&config.engine)?;
//! let report = Walkthrough::new(&config).run(&engine).await?;
//! println!("cache speedup: {:?}", report.cache.comparison.speedup);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod query;
pub mod sources;
pub mod storage;
pub mod walkthrough;
