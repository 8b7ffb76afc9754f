use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use sql_connection::SqlConnect;
use tag_dao::{PostgresTaggingStore, TaggingStore};
use tag_errors::TagStoreError;
use tag_models::{EngagementWindow, Tag, TagImpactMetrics};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

pub const DEFAULT_DAYS_BACK: i64 = 30;

/// Stand-in for the mean engagement of untagged content; uplift is measured
/// against it until a real baseline is computed upstream.
const ENGAGEMENT_BASELINE: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ImpactError {
    #[error("Store error: {0}")]
    Store(#[from] TagStoreError),
    #[error("Tag not found: {tag_id}")]
    TagNotFound { tag_id: Uuid },
}

#[derive(Debug, Deserialize)]
pub struct ImpactQuery {
    pub tag_id: Uuid,
    pub days_back: Option<i64>,
}

#[derive(Clone)]
pub struct ImpactQueryHandler {
    tagging_store: Arc<dyn TaggingStore>,
}

impl ImpactQueryHandler {
    pub fn new(db: SqlConnect) -> Self {
        Self {
            tagging_store: Arc::new(PostgresTaggingStore::new(db)),
        }
    }

    pub fn with_custom_components(
        tagging_store: Arc<dyn TaggingStore>,
    ) -> Self {
        Self { tagging_store }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: ImpactQuery,
    ) -> Result<TagImpactMetrics, ImpactError> {
        let days_back = query.days_back.unwrap_or(DEFAULT_DAYS_BACK).max(1);

        // An unknown tag is an error; a known tag with no recent activity
        // yields a zeroed report.
        let tag = self
            .tagging_store
            .find_tag(query.tag_id)
            .await?
            .ok_or(ImpactError::TagNotFound {
                tag_id: query.tag_id,
            })?;

        let since = Utc::now() - Duration::days(days_back);
        let window = self
            .tagging_store
            .engagement_in_window(tag.id, since)
            .await?;

        Ok(compute_impact(&tag, days_back, &window))
    }
}

fn compute_impact(
    tag: &Tag, window_days: i64, window: &EngagementWindow,
) -> TagImpactMetrics {
    if window.tagged_entities == 0 {
        return TagImpactMetrics {
            tag_id: tag.id,
            tag_name: tag.name.clone(),
            window_days,
            tagged_entities: 0,
            avg_likes: 0.0,
            avg_comments: 0.0,
            avg_shares: 0.0,
            engagement_uplift: 0.0,
            reach_score: 0.0,
            viral_coefficient: 0.0,
        };
    }

    let tagged_engagement =
        window.avg_likes + window.avg_comments + window.avg_shares;
    let engagement_uplift = (tagged_engagement - ENGAGEMENT_BASELINE)
        / ENGAGEMENT_BASELINE
        * 100.0;

    let reach_score = window.avg_shares * 10.0
        + window.avg_comments * 5.0
        + window.avg_likes * 2.0;

    let viral_coefficient = window.avg_shares / window.avg_likes.max(1.0);

    TagImpactMetrics {
        tag_id: tag.id,
        tag_name: tag.name.clone(),
        window_days,
        tagged_entities: window.tagged_entities,
        avg_likes: window.avg_likes,
        avg_comments: window.avg_comments,
        avg_shares: window.avg_shares,
        engagement_uplift,
        reach_score,
        viral_coefficient,
    }
}
