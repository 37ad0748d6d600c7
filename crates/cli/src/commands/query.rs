//! One named query or ad-hoc SQL against the dataset view.

use anyhow::Result;
use homesales_common::config::AppConfig;
use homesales_runtime::query::catalog::AnalysisQuery;
use homesales_runtime::query::report::batches_to_json_rows;
use owo_colors::OwoColorize;

use super::helpers::{heading, loaded_engine, print_table, seconds, QueryCommandResult};
use crate::output::{self, OutputFormat};

pub enum QueryTarget {
    /// Name or 1-based number of a walkthrough query
    Named(String),
    Sql(String),
}

pub async fn query(config: &AppConfig, target: &QueryTarget, format: OutputFormat) -> Result<()> {
    let (named, sql) = match target {
        QueryTarget::Named(name) => {
            let query: AnalysisQuery = name.parse()?;
            (Some(query), query.sql(&config.dataset.view_name))
        }
        QueryTarget::Sql(sql) => (None, sql.clone()),
    };

    let engine = loaded_engine(config).await?;
    let output = engine.execute(&sql).await?;

    if format.is_machine_readable() {
        return output::print_success(
            format,
            QueryCommandResult {
                name: named.map(|q| q.name().to_string()),
                sql,
                row_count: output.row_count(),
                elapsed_seconds: output.elapsed.as_secs_f64(),
                cache_hit: output.served_from_cache(),
                rows: batches_to_json_rows(&output.batches)?,
            },
        );
    }

    match named {
        Some(query) => heading(&format!("{}. {}", query.number(), query.title())),
        None => heading(&sql),
    }
    print_table(&output.batches)?;
    println!(
        "{} {} rows in {}",
        "Returned".dimmed(),
        output.row_count(),
        seconds(output.elapsed)
    );
    Ok(())
}
