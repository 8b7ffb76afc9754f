use std::sync::Arc;

use memory_cache::MemoryCache;
use serde::Deserialize;
use sql_connection::SqlConnect;
use tag_dao::{PostgresTagSummaryStore, TagSummaryStore};
use tag_errors::TagStoreError;
use tag_models::TagUsage;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cache_keys::{SUMMARY_TTL, top_tags_key};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum TopTagsError {
    #[error("Store error: {0}")]
    Store(#[from] TagStoreError),
}

#[derive(Debug, Deserialize)]
pub struct TopTagsQuery {
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct TopTagsQueryHandler {
    summary_store: Arc<dyn TagSummaryStore>,
    cache: MemoryCache,
}

impl TopTagsQueryHandler {
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
    pub async fn execute(
        &self, query: TopTagsQuery,
    ) -> Result<Vec<TagUsage>, TopTagsError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let key = top_tags_key(query.entity_type.as_deref(), limit);

        if let Ok(Some(tags)) = self.cache.get::<Vec<TagUsage>>(&key).await {
            debug!("Cache hit for {key}");
            return Ok(tags);
        }

        debug!("Cache miss for {key}, querying summary");
        let tags = self
            .summary_store
            .top_tags(query.entity_type.as_deref(), limit)
            .await?;

        // Cache writes are best-effort and never fail the request.
        if let Err(e) = self.cache.set(&key, &tags, SUMMARY_TTL).await {
            warn!("Failed to cache top tags under {key}: {e}");
        }

        Ok(tags)
    }
}
