use std::sync::Arc;

use serde::Deserialize;
use sql_connection::SqlConnect;
use tag_dao::{PostgresSubscriptionStore, SubscriptionStore};
use tag_errors::TagStoreError;
use tag_models::TagFeedEntry;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Store error: {0}")]
    Store(#[from] TagStoreError),
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Resolves the feed for an already-authenticated user. The feed is never
/// cached; freshness wins over hit rate here.
#[derive(Clone)]
pub struct FeedQueryHandler {
    subscription_store: Arc<dyn SubscriptionStore>,
}

impl FeedQueryHandler {
    pub fn new(db: SqlConnect) -> Self {
        Self {
            subscription_store: Arc::new(PostgresSubscriptionStore::new(db)),
        }
    }

    pub fn with_custom_components(
        subscription_store: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self { subscription_store }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: FeedQuery,
    ) -> Result<Vec<TagFeedEntry>, FeedError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0).max(0);

        let tag_ids = self
            .subscription_store
            .subscribed_tag_ids(query.user_id)
            .await?;

        if tag_ids.is_empty() {
            debug!("User {} follows no tags", query.user_id);
            return Ok(vec![]);
        }

        Ok(self
            .subscription_store
            .feed_entries(&tag_ids, limit, offset)
            .await?)
    }
}
