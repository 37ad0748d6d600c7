//! Write the partitioned Parquet copy of the dataset and register it.

use anyhow::Result;
use homesales_common::config::AppConfig;
use owo_colors::OwoColorize;

use super::helpers::{loaded_engine, seconds, PartitionCommandResult};
use crate::output::{self, OutputFormat};

pub async fn partition(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let view = config.dataset.view_name.as_str();
    let settings = &config.partition;

    let engine = loaded_engine(config).await?;
    let summary = engine.write_partitioned(view, settings).await?;
    engine.register_partitioned_view(view, settings).await?;
    let view_rows = engine.count_rows(&settings.view_name).await?;

    if format.is_machine_readable() {
        return output::print_success(
            format,
            PartitionCommandResult {
                summary,
                view_name: settings.view_name.clone(),
                view_rows,
            },
        );
    }

    println!(
        "{} {} rows of {} to {} in {}",
        "Wrote".bold().green(),
        summary.rows_written,
        view.yellow(),
        summary.output_dir.yellow(),
        seconds(summary.elapsed)
    );
    for p in &summary.partitions {
        println!(
            "  {} {}={} ({} files)",
            "•".cyan(),
            summary.column,
            p.value.bold(),
            p.files
        );
    }
    println!(
        "{} {} reads {} rows",
        "View".bold(),
        settings.view_name.yellow(),
        view_rows
    );
    Ok(())
}
