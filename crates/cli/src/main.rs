//! homesales: ad-hoc SQL analysis of a home sales dataset.
//!
//! # Commands
//!
//! - `run`: the whole walkthrough (queries, caching, partitioned Parquet).
//! - `query`: one walkthrough query by name or number, or ad-hoc SQL.
//! - `partition`: write the dataset as Parquet partitioned by a column.
//! - `describe`: schema and row count of the dataset view.
//! - `queries`: list the walkthrough queries.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;
mod config;
mod exit_codes;
mod output;

use commands::QueryTarget;
use config::Overrides;
use homesales_common::config::{AppConfig, DEFAULT_CONFIG_PATH};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "homesales")]
#[command(about = "Ad-hoc SQL analysis of home sales data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the YAML configuration file
    #[arg(long, global = true, env = "HOMESALES_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Dataset CSV path (overrides dataset.path)
    #[arg(long, global = true)]
    dataset: Option<String>,

    /// Output format (human, json, yaml)
    #[arg(long, global = true, value_enum, default_value = "human")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full walkthrough
    Run,
    /// Run one walkthrough query, or ad-hoc SQL with --sql
    Query {
        /// Query name or number (see `homesales queries`)
        #[arg(required_unless_present = "sql", conflicts_with = "sql")]
        name: Option<String>,
        /// SQL to run against the dataset view
        #[arg(long)]
        sql: Option<String>,
    },
    /// Write the dataset as partitioned Parquet and register it as a view
    Partition {
        /// Output directory (overrides partition.output_dir)
        #[arg(long)]
        output_dir: Option<String>,
        /// Partition column (overrides partition.column)
        #[arg(long)]
        column: Option<String>,
    },
    /// Show the dataset view's schema and row count
    Describe,
    /// List the walkthrough queries
    Queries,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            dataset: self.dataset.clone(),
            ..Default::default()
        };
        if let Commands::Partition { output_dir, column } = &self.command {
            overrides.output_dir = output_dir.clone();
            overrides.partition_column = column.clone();
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    let cli = Cli::parse();

    let config = match config::load(&cli.config, &cli.overrides()) {
        Ok(config) => config,
        Err(e) => fail(cli.output, &e),
    };

    if let Err(e) = init_tracing(&config) {
        eprintln!("{} {:#}", "Warning:".yellow().bold(), e);
    }
    tracing::debug!(
        config = %cli.config,
        dataset = ?config.dataset.path,
        "Configuration loaded"
    );

    let result = run_cli(&cli, &config).await;
    homesales_common::telemetry::shutdown_telemetry();

    if let Err(e) = result {
        fail(cli.output, &e);
    }
    Ok(())
}

/// Logs go to stderr so machine-readable stdout stays parseable.
fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let otel_layer = homesales_common::telemetry::layer_from_config(&config.telemetry)?;
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(stderr_layer)
        .try_init()?;
    Ok(())
}

fn fail(format: OutputFormat, e: &anyhow::Error) -> ! {
    let exit_code = exit_codes::for_error(e);
    if format.is_machine_readable() {
        output::print_error(format, e, exit_code).ok();
    } else {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
    }
    std::process::exit(exit_code);
}

async fn run_cli(cli: &Cli, config: &AppConfig) -> Result<(), anyhow::Error> {
    match &cli.command {
        Commands::Run => {
            commands::run(config, cli.output).await?;
        }
        Commands::Query { name, sql } => {
            let target = match (name, sql) {
                (_, Some(sql)) => QueryTarget::Sql(sql.clone()),
                (Some(name), None) => QueryTarget::Named(name.clone()),
                (None, None) => anyhow::bail!("usage: pass a query name or --sql"),
            };
            commands::query(config, &target, cli.output).await?;
        }
        Commands::Partition { .. } => {
            commands::partition(config, cli.output).await?;
        }
        Commands::Describe => {
            commands::describe(config, cli.output).await?;
        }
        Commands::Queries => {
            commands::list_queries(config, cli.output)?;
        }
    }
    Ok(())
}
