//! Describe and queries commands.
//!
//! # Commands
//! - **describe**: schema and row count of the dataset view.
//! - **queries**: the walkthrough queries with the SQL they run.

use anyhow::Result;
use homesales_common::config::AppConfig;
use homesales_runtime::query::catalog::AnalysisQuery;
use owo_colors::OwoColorize;

use super::helpers::{loaded_engine, ColumnInfo, DescribeResult, QueryInfo, QueryList};
use crate::output::{self, OutputFormat};

pub async fn describe(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let view = config.dataset.view_name.clone();
    let engine = loaded_engine(config).await?;
    let schema = engine.view_schema(&view).await?;
    let rows = engine.count_rows(&view).await?;

    let result = DescribeResult {
        path: config.dataset.require_path()?.to_string(),
        view,
        rows,
        columns: schema
            .fields()
            .iter()
            .map(|f| ColumnInfo {
                name: f.name().clone(),
                data_type: f.data_type().to_string(),
                nullable: f.is_nullable(),
            })
            .collect(),
    };

    if format.is_machine_readable() {
        return output::print_success(format, &result);
    }

    println!(
        "{} {} ({} rows) from {}",
        "View:".bold().blue(),
        result.view.bold(),
        result.rows,
        result.path.dimmed()
    );
    println!("  {}", "Columns:".dimmed());
    for col in &result.columns {
        let attrib = if col.nullable {
            String::new()
        } else {
            format!(" [{}]", "NOT NULL".dimmed())
        };
        println!(
            "    {} {}: {}{}",
            "•".cyan(),
            col.name.bold(),
            col.data_type,
            attrib
        );
    }
    Ok(())
}

pub fn list_queries(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let view = config.dataset.view_name.as_str();
    let list = QueryList {
        queries: AnalysisQuery::all()
            .into_iter()
            .map(|q| QueryInfo {
                number: q.number(),
                name: q.name(),
                title: q.title(),
                sql: q.sql(view),
            })
            .collect(),
    };

    if format.is_machine_readable() {
        return output::print_success(format, &list);
    }

    for q in &list.queries {
        println!(
            "{} {} {}",
            format!("{}.", q.number).bold(),
            q.name.yellow(),
            q.title.dimmed()
        );
    }
    Ok(())
}
