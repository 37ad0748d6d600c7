//! The full walkthrough.

use anyhow::Result;
use homesales_common::config::AppConfig;
use homesales_runtime::engine::AnalysisEngine;
use homesales_runtime::walkthrough::{Walkthrough, WalkthroughReport};
use owo_colors::OwoColorize;

use super::helpers::{heading, print_table, seconds};
use crate::output::{self, OutputFormat};

pub async fn run(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let engine = AnalysisEngine::new(&config.engine)?;
    let report = Walkthrough::new(config).run(&engine).await?;

    if format.is_machine_readable() {
        return output::print_success(format, &report);
    }
    print_report(&report)
}

fn print_report(report: &WalkthroughReport) -> Result<()> {
    println!(
        "{} {} ({} rows) from {}",
        "Loaded view".bold(),
        report.dataset.view.yellow(),
        report.dataset.rows,
        report.dataset.path.dimmed()
    );

    for query in &report.queries {
        heading(&format!("{}. {}", query.number, query.title));
        print_table(&query.batches)?;
        println!("{} {}", "Elapsed:".dimmed(), seconds(query.run.elapsed));
    }

    let cache = &report.cache;
    heading("Caching");
    println!(
        "{} {} ({} rows, {} partitions, {} bytes)",
        "Cached".bold(),
        cache.summary.view.yellow(),
        cache.summary.rows,
        cache.summary.partitions,
        cache.summary.bytes
    );
    println!("  {} {}", "is cached:".dimmed(), cache.cached_after_cache);
    println!(
        "  {} {}",
        "uncached run:".dimmed(),
        seconds(cache.comparison.before.elapsed)
    );
    println!(
        "  {} {}",
        "cached run:  ".dimmed(),
        seconds(cache.comparison.after.elapsed)
    );
    match cache.comparison.speedup() {
        Some(speedup) => println!("  {} {:.2}x", "speedup:".dimmed(), speedup),
        None => println!("  {} n/a", "speedup:".dimmed()),
    }
    println!(
        "  {} {}",
        "results match:".dimmed(),
        verdict(cache.cached_matches_uncached)
    );

    let partition = &report.partition;
    heading("Partitioned Parquet");
    println!(
        "{} {} rows to {} by {}",
        "Wrote".bold(),
        partition.write.rows_written,
        partition.write.output_dir.yellow(),
        partition.write.column.bold()
    );
    for p in &partition.write.partitions {
        println!(
            "  {} {}={} ({} files)",
            "•".cyan(),
            partition.write.column,
            p.value,
            p.files
        );
    }
    println!(
        "{} {} in {}",
        "Queried".bold(),
        partition.view_name.yellow(),
        seconds(partition.run.elapsed)
    );
    print_table(&partition.batches)?;
    println!(
        "  {} {}",
        "results match:".dimmed(),
        verdict(partition.matches_uncached)
    );

    heading("Uncaching");
    println!(
        "  {} {}",
        "is cached:".dimmed(),
        cache.cached_after_uncache
    );
    Ok(())
}

fn verdict(ok: bool) -> String {
    if ok {
        "yes".green().to_string()
    } else {
        "NO".red().bold().to_string()
    }
}
