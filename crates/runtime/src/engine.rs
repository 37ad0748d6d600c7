//! The analysis engine.
//!
//! `AnalysisEngine` owns the DataFusion `SessionContext` every view lives in.
//! It is responsible for:
//!
//! 1. **Session State**: memory pool, spill directory, partitioning and any raw
//!    DataFusion options from the `engine` config section.
//! 2. **Views**: create-or-replace registration of dataset sources.
//! 3. **Execution**: SQL with a timeout, plus the `CACHE TABLE` /
//!    `UNCACHE TABLE` statements, which DataFusion does not plan itself.
//! 4. **Caching**: delegated to [`ViewCache`].
//!
//! # Query Lifecycle
//!
//! 1. `execute(sql)` called.
//! 2. Cache statements are intercepted and routed to the view cache.
//! 3. Everything else is planned by DataFusion; the scanned views are recorded
//!    so the log line says whether the result came from cached data.
//! 4. The plan is collected under `tokio::time::timeout`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use datafusion::common::tree_node::TreeNodeRecursion;
use datafusion::common::TableReference;
use datafusion::execution::disk_manager::{DiskManagerBuilder, DiskManagerMode};
use datafusion::execution::memory_pool::{FairSpillPool, GreedyMemoryPool};
use datafusion::execution::runtime_env::RuntimeEnvBuilder;
use datafusion::logical_expr::LogicalPlan;
use datafusion::prelude::{SessionConfig, SessionContext};
use datafusion::sql::sqlparser::ast::Statement;
use datafusion::sql::sqlparser::dialect::GenericDialect;
use datafusion::sql::sqlparser::parser::Parser;
use homesales_common::config::{is_valid_view_name, DatasetSettings, EngineSettings, PartitionSettings};
use homesales_error::{ErrorCode, ErrorContext, HomeSalesError};
use tracing::{debug, error, info};

use crate::query::cache::{CachedViewSummary, ViewCache};
use crate::sources::{CsvSource, DatasetSource, ParquetSource};
use crate::storage::{self, PartitionWriteSummary};

/// Default catalog views are registered in
pub const CATALOG: &str = "homesales";
/// Default schema views are registered in
pub const SCHEMA: &str = "public";

/// A collected query result
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub sql: String,
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
    pub elapsed: Duration,
    /// Cached views the query read from
    pub cached_views: Vec<String>,
}

impl QueryOutput {
    pub fn row_count(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn served_from_cache(&self) -> bool {
        !self.cached_views.is_empty()
    }

    fn empty(sql: &str, elapsed: Duration) -> Self {
        Self {
            sql: sql.to_string(),
            schema: Arc::new(Schema::empty()),
            batches: vec![],
            elapsed,
            cached_views: vec![],
        }
    }
}

/// Statements handled by the engine rather than DataFusion
enum CacheStatement {
    Cache {
        view: TableReference,
        query: Option<String>,
    },
    Uncache {
        view: TableReference,
        if_exists: bool,
    },
}

/// Counts a query as active until dropped, so cancelled queries are released too.
struct ActiveQueryGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveQueryGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::Relaxed);
        Self { active }
    }
}

impl Drop for ActiveQueryGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

pub struct AnalysisEngine {
    context: SessionContext,
    cache: ViewCache,
    query_timeout: Duration,
    active_queries: Arc<AtomicUsize>,
}

impl AnalysisEngine {
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        let context = Self::build_session_context(settings)?;
        Ok(Self {
            context,
            cache: ViewCache::new(),
            query_timeout: Duration::from_secs(settings.query_timeout_seconds),
            active_queries: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn active_queries(&self) -> usize {
        self.active_queries.load(Ordering::Relaxed)
    }

    fn build_session_context(settings: &EngineSettings) -> Result<SessionContext> {
        let mut session_config = SessionConfig::new()
            .with_default_catalog_and_schema(CATALOG, SCHEMA)
            .with_information_schema(true)
            .with_target_partitions(settings.target_partitions);

        session_config.options_mut().execution.parquet.pushdown_filters = true;
        session_config.options_mut().execution.parquet.pruning = true;

        for (key, value) in &settings.datafusion_config {
            session_config
                .options_mut()
                .set(key, value)
                .map_err(|e| {
                    anyhow::Error::from(
                        HomeSalesError::new(
                            ErrorCode::InvalidConfig,
                            format!("Failed to set DataFusion option '{}': {}", key, e),
                        )
                        .with_context(ErrorContext::Config {
                            file_path: None,
                            field: Some(format!("engine.datafusion_config.{}", key)),
                        }),
                    )
                })?;
        }

        let mut rt_builder = RuntimeEnvBuilder::new();

        if let Some(limit_mb) = settings.memory_limit_mb {
            // Spills to disk instead of failing once the limit is reached
            rt_builder = rt_builder.with_memory_pool(Arc::new(FairSpillPool::new(limit_mb * 1024 * 1024)));
        } else {
            rt_builder = rt_builder.with_memory_pool(Arc::new(GreedyMemoryPool::new(usize::MAX)));
        }

        let disk_manager = match &settings.spill_dir {
            Some(dir) => DiskManagerBuilder::default()
                .with_mode(DiskManagerMode::Directories(vec![PathBuf::from(dir)])),
            None => DiskManagerBuilder::default(),
        };
        rt_builder = rt_builder.with_disk_manager_builder(disk_manager);

        let runtime_env = rt_builder.build().context("Failed to build RuntimeEnv")?;

        debug!(
            target_partitions = settings.target_partitions,
            memory_limit_mb = ?settings.memory_limit_mb,
            spill_dir = ?settings.spill_dir,
            "Session context built"
        );

        Ok(SessionContext::new_with_config_rt(
            session_config,
            Arc::new(runtime_env),
        ))
    }

    /// Register `source` as `view`, replacing any existing view of that name.
    ///
    /// A cached copy of the replaced view is discarded, not restored.
    pub async fn register_view(&self, view: &str, source: &dyn DatasetSource) -> Result<SchemaRef> {
        validate_view_name(view)?;

        let provider = source.table_provider(&self.context).await?;
        let schema = provider.schema();

        self.cache.forget(view).await;
        self.context.deregister_table(view)?;
        self.context.register_table(view, provider)?;

        info!(
            view,
            kind = source.kind(),
            location = source.location(),
            columns = schema.fields().len(),
            "View registered"
        );
        Ok(schema)
    }

    /// Register the configured home sales CSV under its configured view name.
    pub async fn register_home_sales(&self, settings: &DatasetSettings) -> Result<SchemaRef> {
        let source = CsvSource::from_settings(settings)?;
        self.register_view(&settings.view_name, &source).await
    }

    /// Registered view names, sorted.
    pub fn view_names(&self) -> Vec<String> {
        let mut names = self
            .context
            .catalog(CATALOG)
            .and_then(|catalog| catalog.schema(SCHEMA))
            .map(|schema| schema.table_names())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn has_view(&self, view: &str) -> Result<bool> {
        Ok(self.context.table_exist(view)?)
    }

    pub async fn view_schema(&self, view: &str) -> Result<SchemaRef> {
        self.ensure_view(view)?;
        let provider = self
            .context
            .table_provider(view)
            .await
            .map_err(HomeSalesError::from)?;
        Ok(provider.schema())
    }

    pub async fn count_rows(&self, view: &str) -> Result<usize> {
        self.ensure_view(view)?;
        let df = self.context.table(view).await.map_err(HomeSalesError::from)?;
        Ok(df.count().await.map_err(HomeSalesError::from)?)
    }

    /// Run one SQL statement and collect its result.
    pub async fn execute(&self, sql: &str) -> Result<QueryOutput> {
        let _active = ActiveQueryGuard::new(self.active_queries.clone());
        self.execute_inner(sql).await
    }

    async fn execute_inner(&self, sql: &str) -> Result<QueryOutput> {
        let start = Instant::now();

        if let Some(statement) = parse_cache_statement(sql)? {
            self.run_cache_statement(statement).await?;
            return Ok(QueryOutput::empty(sql, start.elapsed()));
        }

        let df = self
            .context
            .sql(sql)
            .await
            .map_err(HomeSalesError::from)?;

        let mut cached_views = vec![];
        for view in scanned_tables(df.logical_plan()) {
            if self.cache.is_cached(&view).await && !cached_views.contains(&view) {
                cached_views.push(view);
            }
        }

        let schema: SchemaRef = df.schema().inner().clone();
        let result = tokio::time::timeout(self.query_timeout, df.collect()).await;

        let batches = match result {
            Ok(Ok(batches)) => batches,
            Ok(Err(e)) => {
                error!(target: "queries", query = sql, "Query failed: {}", e);
                return Err(HomeSalesError::from(e).into());
            }
            Err(_) => {
                let seconds = self.query_timeout.as_secs();
                return Err(HomeSalesError::new(
                    ErrorCode::QueryTimeout,
                    format!("Query timed out after {} seconds", seconds),
                )
                .with_context(ErrorContext::Timeout {
                    timeout_seconds: seconds,
                    sql: sql.to_string(),
                })
                .with_hint("Simplify the query or increase 'engine.query_timeout_seconds'")
                .into());
            }
        };

        let output = QueryOutput {
            sql: sql.to_string(),
            schema,
            batches,
            elapsed: start.elapsed(),
            cached_views,
        };

        info!(
            target: "queries",
            query = sql,
            duration_ms = output.elapsed.as_millis() as u64,
            rows_returned = output.row_count(),
            cache_hit = output.served_from_cache(),
            success = true
        );

        Ok(output)
    }

    async fn run_cache_statement(&self, statement: CacheStatement) -> Result<()> {
        match statement {
            CacheStatement::Cache { view, query: None } => {
                let view = self.resolve_view(&view)?;
                self.cache_view(&view).await?;
            }
            CacheStatement::Cache {
                view,
                query: Some(query),
            } => {
                let view = self.resolve_view(&view)?;
                validate_view_name(&view)?;
                let df = self
                    .context
                    .sql(&query)
                    .await
                    .map_err(HomeSalesError::from)?;
                self.cache.forget(&view).await;
                self.context.deregister_table(view.as_str())?;
                self.context.register_table(view.as_str(), df.into_view())?;
                self.cache.cache(&self.context, &view).await?;
            }
            CacheStatement::Uncache { view, if_exists } => {
                let view = self.resolve_view(&view)?;
                self.uncache_view(&view, if_exists).await?;
            }
        }
        Ok(())
    }

    /// Materialize `view` in memory. Idempotent.
    pub async fn cache_view(&self, view: &str) -> Result<CachedViewSummary> {
        self.ensure_view(view)?;
        self.cache.cache(&self.context, view).await
    }

    /// Drop the in-memory copy of `view`.
    ///
    /// Returns whether a cached copy was dropped. Unknown views are an error
    /// unless `if_exists` is set.
    pub async fn uncache_view(&self, view: &str, if_exists: bool) -> Result<bool> {
        if !self.has_view(view)? {
            if if_exists {
                return Ok(false);
            }
            return Err(HomeSalesError::view_not_found(view, self.view_names()).into());
        }
        self.cache.uncache(&self.context, view).await
    }

    pub async fn is_cached(&self, view: &str) -> bool {
        self.cache.is_cached(view).await
    }

    pub async fn cached_views(&self) -> Vec<CachedViewSummary> {
        self.cache.cached_views().await
    }

    /// Uncache every view. Returns how many were cached.
    pub async fn clear_cache(&self) -> Result<usize> {
        self.cache.clear(&self.context).await
    }

    /// Persist `view` as Parquet partitioned by `settings.column`.
    pub async fn write_partitioned(
        &self,
        view: &str,
        settings: &PartitionSettings,
    ) -> Result<PartitionWriteSummary> {
        self.ensure_view(view)?;
        storage::write_partitioned(&self.context, view, settings).await
    }

    /// Register the tree written by [`Self::write_partitioned`] as `settings.view_name`.
    ///
    /// The partition column comes back from directory names, typed as it is in
    /// `source_view`.
    pub async fn register_partitioned_view(
        &self,
        source_view: &str,
        settings: &PartitionSettings,
    ) -> Result<SchemaRef> {
        let source_schema = self.view_schema(source_view).await?;
        let data_type = match source_schema.field_with_name(&settings.column) {
            Ok(field) => field.data_type().clone(),
            Err(_) => {
                return Err(HomeSalesError::new(
                    ErrorCode::PartitionColumnMissing,
                    format!(
                        "Partition column '{}' is not a column of view '{}'",
                        settings.column, source_view
                    ),
                )
                .with_context(ErrorContext::Partition {
                    column: settings.column.clone(),
                    output_dir: settings.output_dir.clone(),
                    available_columns: source_schema
                        .fields()
                        .iter()
                        .map(|f| f.name().clone())
                        .collect(),
                })
                .into())
            }
        };

        let source = ParquetSource::new(settings.output_dir.clone())
            .with_partition_column(settings.column.clone(), data_type);
        self.register_view(&settings.view_name, &source).await
    }

    /// Reduce a possibly qualified name to the bare view name it refers to.
    ///
    /// Views only live in `homesales.public`; any other catalog or schema
    /// names no view.
    fn resolve_view(&self, reference: &TableReference) -> Result<String> {
        let in_default_schema = reference.catalog().is_none_or(|c| c == CATALOG)
            && reference.schema().is_none_or(|s| s == SCHEMA);
        if !in_default_schema {
            return Err(
                HomeSalesError::view_not_found(&reference.to_string(), self.view_names()).into(),
            );
        }
        Ok(reference.table().to_string())
    }

    fn ensure_view(&self, view: &str) -> Result<()> {
        if self.has_view(view)? {
            Ok(())
        } else {
            Err(HomeSalesError::view_not_found(view, self.view_names()).into())
        }
    }
}

/// Recognize `CACHE TABLE` / `UNCACHE TABLE`.
///
/// Anything that does not parse as one of those is left to DataFusion, which
/// reports its own syntax errors.
fn parse_cache_statement(sql: &str) -> Result<Option<CacheStatement>> {
    let trimmed = sql.trim().trim_end_matches(';');
    let Ok(mut statements) = Parser::parse_sql(&GenericDialect {}, trimmed) else {
        return Ok(None);
    };
    if statements.len() != 1 {
        return Ok(None);
    }

    match statements.remove(0) {
        Statement::Cache {
            table_flag,
            table_name,
            query,
            ..
        } => {
            if let Some(flag) = table_flag {
                return Err(HomeSalesError::new(
                    ErrorCode::NotImplemented,
                    format!("CACHE {} TABLE is not supported", flag),
                )
                .with_hint("Use CACHE TABLE, which caches eagerly")
                .into());
            }
            Ok(Some(CacheStatement::Cache {
                view: TableReference::parse_str(&table_name.to_string()),
                query: query.map(|q| q.to_string()),
            }))
        }
        Statement::UNCache {
            table_name,
            if_exists,
            ..
        } => Ok(Some(CacheStatement::Uncache {
            view: TableReference::parse_str(&table_name.to_string()),
            if_exists,
        })),
        _ => Ok(None),
    }
}

fn validate_view_name(view: &str) -> Result<()> {
    if is_valid_view_name(view) {
        return Ok(());
    }
    Err(HomeSalesError::new(
        ErrorCode::InvalidViewName,
        format!("'{}' is not a valid view name", view),
    )
    .with_hint("View names are lowercase identifiers: letters, digits and '_'")
    .into())
}

/// Names of the tables a plan scans, subqueries included.
fn scanned_tables(plan: &LogicalPlan) -> Vec<String> {
    let mut tables = vec![];
    let _ = plan.apply_with_subqueries(|node| {
        if let LogicalPlan::TableScan(scan) = node {
            tables.push(scan.table_name.table().to_string());
        }
        Ok(TreeNodeRecursion::Continue)
    });
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, Int64Array};
    use arrow::datatypes::{DataType, Field};
    use datafusion::datasource::MemTable;

    fn engine_with_sales() -> Result<AnalysisEngine> {
        let engine = AnalysisEngine::new(&EngineSettings::default())?;
        let schema = Arc::new(Schema::new(vec![
            Field::new("bedrooms", DataType::Int32, false),
            Field::new("price", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![3, 4, 4])),
                Arc::new(Int64Array::from(vec![300_000, 410_000, 390_000])),
            ],
        )?;
        let table = MemTable::try_new(schema, vec![vec![batch]])?;
        engine.context().register_table("sales", Arc::new(table))?;
        Ok(engine)
    }

    #[tokio::test]
    async fn test_engine_init() -> Result<()> {
        let engine = AnalysisEngine::new(&EngineSettings::default())?;
        assert_eq!(engine.active_queries(), 0);
        assert!(engine.view_names().is_empty());
        let state = engine.context().state();
        assert_eq!(state.config().options().execution.target_partitions, 4);
        Ok(())
    }

    #[test]
    fn test_bad_datafusion_option_is_config_error() {
        let mut settings = EngineSettings::default();
        settings
            .datafusion_config
            .insert("datafusion.no_such.option".to_string(), "1".to_string());
        let err = AnalysisEngine::new(&settings).err().unwrap();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::InvalidConfig);
    }

    #[tokio::test]
    async fn test_execute_simple() -> Result<()> {
        let engine = engine_with_sales()?;
        let output = engine
            .execute("SELECT bedrooms, AVG(price) AS avg_price FROM sales GROUP BY bedrooms ORDER BY bedrooms")
            .await?;
        assert_eq!(output.row_count(), 2);
        assert_eq!(output.schema.fields().len(), 2);
        assert!(!output.served_from_cache());
        assert_eq!(engine.active_queries(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_statements() -> Result<()> {
        let engine = engine_with_sales()?;

        let output = engine.execute("CACHE TABLE sales;").await?;
        assert_eq!(output.row_count(), 0);
        assert!(engine.is_cached("sales").await);

        let output = engine.execute("SELECT COUNT(*) FROM sales").await?;
        assert_eq!(output.cached_views, vec!["sales".to_string()]);

        engine.execute("UNCACHE TABLE sales").await?;
        assert!(!engine.is_cached("sales").await);

        engine.execute("UNCACHE TABLE IF EXISTS nowhere").await?;
        let err = engine.execute("UNCACHE TABLE nowhere").await.unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::ViewNotFound);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_table_as_query() -> Result<()> {
        let engine = engine_with_sales()?;
        engine
            .execute("CACHE TABLE four_bed AS SELECT * FROM sales WHERE bedrooms = 4")
            .await?;
        assert!(engine.is_cached("four_bed").await);
        assert_eq!(engine.count_rows("four_bed").await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_lazy_cache_not_supported() -> Result<()> {
        let engine = engine_with_sales()?;
        let err = engine.execute("CACHE LAZY TABLE sales").await.unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::NotImplemented);
        assert!(!engine.is_cached("sales").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_view_suggests_name() -> Result<()> {
        let engine = engine_with_sales()?;
        let err = engine.count_rows("sale").await.unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::ViewNotFound);
        assert_eq!(hs.hint.as_deref(), Some("Did you mean 'sales'?"));
        Ok(())
    }

    #[tokio::test]
    async fn test_syntax_error() -> Result<()> {
        let engine = engine_with_sales()?;
        let err = engine.execute("SELEC * FROM sales").await.unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::SyntaxError);
        assert_eq!(engine.active_queries(), 0);
        Ok(())
    }

    #[test]
    fn test_parse_cache_statement() {
        assert!(matches!(
            parse_cache_statement("cache table Home_Sales").unwrap(),
            Some(CacheStatement::Cache { ref view, query: None }) if view.table() == "home_sales"
        ));
        assert!(matches!(
            parse_cache_statement("UNCACHE TABLE IF EXISTS home_sales;").unwrap(),
            Some(CacheStatement::Uncache { ref view, if_exists: true }) if view.table() == "home_sales"
        ));
        assert!(matches!(
            parse_cache_statement("CACHE TABLE homesales.public.home_sales").unwrap(),
            Some(CacheStatement::Cache { ref view, .. })
                if view.table() == "home_sales" && view.schema() == Some("public")
        ));
        assert!(parse_cache_statement("SELECT 1").unwrap().is_none());
        assert!(parse_cache_statement("not sql at all").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_by_qualified_name() -> Result<()> {
        let engine = engine_with_sales()?;

        engine.execute("CACHE TABLE homesales.public.sales").await?;
        assert!(engine.is_cached("sales").await);
        let names: Vec<String> = engine
            .cached_views()
            .await
            .into_iter()
            .map(|s| s.view)
            .collect();
        assert_eq!(names, vec!["sales".to_string()]);

        let output = engine.execute("SELECT COUNT(*) FROM sales").await?;
        assert!(output.served_from_cache());

        assert!(engine.uncache_view("sales", false).await?);
        assert!(!engine.is_cached("sales").await);

        engine.execute("CACHE TABLE public.sales").await?;
        engine.execute("UNCACHE TABLE homesales.public.sales").await?;
        assert!(!engine.is_cached("sales").await);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_in_other_schema_is_unknown_view() -> Result<()> {
        let engine = engine_with_sales()?;
        for sql in [
            "CACHE TABLE other.sales",
            "CACHE TABLE elsewhere.public.sales",
            "UNCACHE TABLE other.sales",
        ] {
            let err = engine.execute(sql).await.unwrap_err();
            let hs = err.downcast_ref::<HomeSalesError>().unwrap();
            assert_eq!(hs.code, ErrorCode::ViewNotFound, "{}", sql);
        }
        assert!(engine.cached_views().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_as_query_checks_view_name() -> Result<()> {
        let engine = engine_with_sales()?;
        let err = engine
            .execute(r#"CACHE TABLE "Bad Name" AS SELECT * FROM sales"#)
            .await
            .unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::InvalidViewName);
        assert!(!engine.view_names().contains(&"Bad Name".to_string()));
        assert!(engine.cached_views().await.is_empty());
        Ok(())
    }

    const ENDLESS_QUERY: &str = "SELECT a.value % 7 AS k, SUM(a.value * b.value) AS total \
         FROM generate_series(1, 1000000) a CROSS JOIN generate_series(1, 1000000) b \
         GROUP BY k";

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_query_timeout() -> Result<()> {
        let settings = EngineSettings {
            query_timeout_seconds: 1,
            ..Default::default()
        };
        let engine = AnalysisEngine::new(&settings)?;

        let err = engine.execute(ENDLESS_QUERY).await.unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::QueryTimeout);
        match &hs.context {
            Some(ErrorContext::Timeout {
                timeout_seconds,
                sql,
            }) => {
                assert_eq!(*timeout_seconds, 1);
                assert_eq!(sql, ENDLESS_QUERY);
            }
            other => panic!("Expected Timeout context, got {:?}", other),
        }
        assert_eq!(engine.active_queries(), 0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_query_is_not_counted() -> Result<()> {
        let engine = AnalysisEngine::new(&EngineSettings::default())?;

        let abandoned =
            tokio::time::timeout(Duration::from_millis(200), engine.execute(ENDLESS_QUERY)).await;
        assert!(abandoned.is_err());
        assert_eq!(engine.active_queries(), 0);
        Ok(())
    }
}
