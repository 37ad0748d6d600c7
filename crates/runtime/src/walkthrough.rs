//! The end-to-end analysis of the home sales dataset.
//!
//! load → register view → four queries → cache → rerun + compare timing →
//! partitioned write → register partitioned view → query it → uncache → verify

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use homesales_common::config::{AppConfig, DatasetSettings, PartitionSettings};
use serde::Serialize;
use tracing::info;

use crate::engine::AnalysisEngine;
use crate::query::cache::CachedViewSummary;
use crate::query::catalog::AnalysisQuery;
use crate::query::report::{batches_to_json_rows, result_fingerprint, JsonRow};
use crate::query::timing::{time_query, TimedRun, TimingComparison};
use crate::storage::PartitionWriteSummary;

/// Query rerun against the cached and partitioned views
pub const COMPARISON_QUERY: AnalysisQuery = AnalysisQuery::PriceByViewRating;

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub view: String,
    pub path: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub number: usize,
    pub name: &'static str,
    pub title: &'static str,
    pub sql: String,
    pub rows: Vec<JsonRow>,
    pub run: TimedRun,
    #[serde(skip)]
    pub batches: Vec<RecordBatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub summary: CachedViewSummary,
    pub comparison: TimingComparison,
    pub cached_matches_uncached: bool,
    pub cached_after_cache: bool,
    pub cached_after_uncache: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionReport {
    pub write: PartitionWriteSummary,
    pub view_name: String,
    pub run: TimedRun,
    pub matches_uncached: bool,
    #[serde(skip)]
    pub batches: Vec<RecordBatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughReport {
    pub dataset: DatasetSummary,
    pub queries: Vec<QueryResult>,
    pub cache: CacheReport,
    pub partition: PartitionReport,
}

pub struct Walkthrough {
    dataset: DatasetSettings,
    partition: PartitionSettings,
}

impl Walkthrough {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            dataset: config.dataset.clone(),
            partition: config.partition.clone(),
        }
    }

    pub async fn run(&self, engine: &AnalysisEngine) -> Result<WalkthroughReport> {
        let view = self.dataset.view_name.as_str();

        let dataset = self.load(engine).await?;

        let mut queries = Vec::with_capacity(AnalysisQuery::all().len());
        for query in AnalysisQuery::all() {
            queries.push(run_named(engine, query, view, "uncached").await?);
        }

        let mut cache = self.compare_cached(engine, &queries).await?;
        let partition = self.partition(engine, &queries).await?;

        engine.uncache_view(view, false).await?;
        cache.cached_after_uncache = engine.is_cached(view).await;
        info!(
            target: "walkthrough",
            view,
            cached = cache.cached_after_uncache,
            "View uncached"
        );

        Ok(WalkthroughReport {
            dataset,
            queries,
            cache,
            partition,
        })
    }

    async fn load(&self, engine: &AnalysisEngine) -> Result<DatasetSummary> {
        let path = self.dataset.require_path()?.to_string();
        let view = self.dataset.view_name.clone();

        let schema = engine.register_home_sales(&self.dataset).await?;
        let rows = engine.count_rows(&view).await?;
        info!(target: "walkthrough", view = %view, path = %path, rows, "Dataset loaded");

        Ok(DatasetSummary {
            view,
            path,
            rows,
            columns: schema.fields().iter().map(|f| f.name().clone()).collect(),
        })
    }

    async fn compare_cached(
        &self,
        engine: &AnalysisEngine,
        queries: &[QueryResult],
    ) -> Result<CacheReport> {
        let view = self.dataset.view_name.as_str();
        let uncached = comparison_result(queries)?;

        let summary = engine.cache_view(view).await?;
        let cached_after_cache = engine.is_cached(view).await;

        let cached = run_named(engine, COMPARISON_QUERY, view, "cached").await?;
        let comparison = TimingComparison::new(uncached.run.clone(), cached.run);
        let cached_matches_uncached =
            result_fingerprint(&uncached.batches)? == result_fingerprint(&cached.batches)?;

        info!(
            target: "walkthrough",
            view,
            uncached_ms = comparison.before.elapsed.as_millis() as u64,
            cached_ms = comparison.after.elapsed.as_millis() as u64,
            matches = cached_matches_uncached,
            "Cached rerun compared"
        );

        Ok(CacheReport {
            summary,
            comparison,
            cached_matches_uncached,
            cached_after_cache,
            // Set once the walkthrough uncaches the view
            cached_after_uncache: cached_after_cache,
        })
    }

    async fn partition(
        &self,
        engine: &AnalysisEngine,
        queries: &[QueryResult],
    ) -> Result<PartitionReport> {
        let view = self.dataset.view_name.as_str();
        let write = engine.write_partitioned(view, &self.partition).await?;
        engine
            .register_partitioned_view(view, &self.partition)
            .await?;

        let partitioned = run_named(
            engine,
            COMPARISON_QUERY,
            &self.partition.view_name,
            "partitioned",
        )
        .await?;
        let matches_uncached = result_fingerprint(&comparison_result(queries)?.batches)?
            == result_fingerprint(&partitioned.batches)?;

        Ok(PartitionReport {
            write,
            view_name: self.partition.view_name.clone(),
            run: partitioned.run,
            matches_uncached,
            batches: partitioned.batches,
        })
    }
}

async fn run_named(
    engine: &AnalysisEngine,
    query: AnalysisQuery,
    view: &str,
    label: &str,
) -> Result<QueryResult> {
    let sql = query.sql(view);
    let (run, output) = time_query(engine, &format!("{}:{}", query.name(), label), &sql).await?;
    Ok(QueryResult {
        number: query.number(),
        name: query.name(),
        title: query.title(),
        rows: batches_to_json_rows(&output.batches)?,
        sql,
        run,
        batches: output.batches,
    })
}

fn comparison_result(queries: &[QueryResult]) -> Result<&QueryResult> {
    queries
        .iter()
        .find(|q| q.number == COMPARISON_QUERY.number())
        .ok_or_else(|| anyhow::anyhow!("Comparison query '{}' was not run", COMPARISON_QUERY))
}
