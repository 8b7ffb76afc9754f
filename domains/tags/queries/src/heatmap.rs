use std::sync::Arc;

use memory_cache::MemoryCache;
use sql_connection::SqlConnect;
use tag_dao::{PostgresTagSummaryStore, TagSummaryStore};
use tag_errors::TagStoreError;
use tag_models::HeatmapCell;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cache_keys::{SUMMARY_TTL, heatmap_key};

#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("Store error: {0}")]
    Store(#[from] TagStoreError),
}

#[derive(Clone)]
pub struct HeatmapQueryHandler {
    summary_store: Arc<dyn TagSummaryStore>,
    cache: MemoryCache,
}

impl HeatmapQueryHandler {
    pub fn new(db: SqlConnect, cache: MemoryCache) -> Self {
        Self {
            summary_store: Arc::new(PostgresTagSummaryStore::new(db)),
            cache,
        }
    }

    pub fn with_custom_components(
        summary_store: Arc<dyn TagSummaryStore>, cache: MemoryCache,
    ) -> Self {
        Self {
            summary_store,
            cache,
        }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self) -> Result<Vec<HeatmapCell>, HeatmapError> {
        let key = heatmap_key();

        if let Ok(Some(cells)) =
            self.cache.get::<Vec<HeatmapCell>>(&key).await
        {
            debug!("Cache hit for {key}");
            return Ok(cells);
        }

        debug!("Cache miss for {key}, querying summary");
        let cells = self.summary_store.heatmap().await?;

        if let Err(e) = self.cache.set(&key, &cells, SUMMARY_TTL).await {
            warn!("Failed to cache heatmap: {e}");
        }

        Ok(cells)
    }
}
