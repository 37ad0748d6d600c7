use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use datafusion::catalog::TableProvider;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use homesales_error::HomeSalesError;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// What was materialized when a view was cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedViewSummary {
    pub view: String,
    pub rows: usize,
    pub partitions: usize,
    /// Arrow memory held by the cached batches
    pub bytes: usize,
}

struct CacheEntry {
    /// Provider the view pointed at before caching; restored on uncache
    original: Arc<dyn TableProvider>,
    summary: CachedViewSummary,
}

/// In-memory copies of registered views.
///
/// Caching collects the view once and re-registers it under the same name as
/// a `MemTable`, so later queries read memory instead of re-scanning the
/// source. The engine's partitioning of the scan is preserved.
#[derive(Default)]
pub struct ViewCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize `view` and swap it for its in-memory copy.
    ///
    /// Caching an already cached view returns the existing summary.
    pub async fn cache(&self, context: &SessionContext, view: &str) -> Result<CachedViewSummary> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(view) {
            debug!(target: "cache", view, "View already cached");
            return Ok(entry.summary.clone());
        }

        let original = context
            .table_provider(view)
            .await
            .map_err(HomeSalesError::from)?;
        let df = context.table(view).await.map_err(HomeSalesError::from)?;
        let schema = df.schema().inner().clone();
        let partitions = df
            .collect_partitioned()
            .await
            .map_err(HomeSalesError::from)?;

        let summary = CachedViewSummary {
            view: view.to_string(),
            rows: partitions.iter().flatten().map(|b| b.num_rows()).sum(),
            partitions: partitions.len(),
            bytes: partitions
                .iter()
                .flatten()
                .map(|b| b.get_array_memory_size())
                .sum(),
        };

        let mem_table = MemTable::try_new(schema, partitions).map_err(HomeSalesError::from)?;
        context.deregister_table(view)?;
        context.register_table(view, Arc::new(mem_table))?;

        info!(
            target: "cache",
            view,
            rows = summary.rows,
            partitions = summary.partitions,
            bytes = summary.bytes,
            "View cached"
        );

        entries.insert(
            view.to_string(),
            CacheEntry {
                original,
                summary: summary.clone(),
            },
        );
        Ok(summary)
    }

    /// Restore the provider `view` had before it was cached.
    ///
    /// Returns `false` when the view was not cached.
    pub async fn uncache(&self, context: &SessionContext, view: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.remove(view) else {
            debug!(target: "cache", view, "View was not cached");
            return Ok(false);
        };

        context.deregister_table(view)?;
        context.register_table(view, entry.original)?;

        info!(
            target: "cache",
            view,
            rows = entry.summary.rows,
            "View uncached"
        );
        Ok(true)
    }

    pub async fn is_cached(&self, view: &str) -> bool {
        self.entries.read().await.contains_key(view)
    }

    /// Drop the entry for `view` without touching the session.
    ///
    /// Used when the view itself is replaced: the cached copy and the saved
    /// provider both describe data that no longer backs that name.
    pub async fn forget(&self, view: &str) -> bool {
        let removed = self.entries.write().await.remove(view).is_some();
        if removed {
            debug!(target: "cache", view, "Dropped cache entry for replaced view");
        }
        removed
    }

    pub async fn cached_views(&self) -> Vec<CachedViewSummary> {
        let mut views: Vec<CachedViewSummary> = self
            .entries
            .read()
            .await
            .values()
            .map(|e| e.summary.clone())
            .collect();
        views.sort_by(|a, b| a.view.cmp(&b.view));
        views
    }

    /// Uncache every view. Returns how many were restored.
    pub async fn clear(&self, context: &SessionContext) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        for (view, entry) in entries.drain() {
            context.deregister_table(view.as_str())?;
            context.register_table(view.as_str(), entry.original)?;
        }
        if count > 0 {
            info!(target: "cache", views = count, "Cache cleared");
        }
        Ok(count)
    }
}
