use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sql_connection::SqlConnect;
use tag_dao::{PostgresTaggingStore, TaggingStore};
use tag_errors::TagStoreError;
use tag_models::{LifecycleBucket, Tag, TagLifecycle};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

/// Taggings in the trailing week count as current usage.
const CURRENT_USAGE_DAYS: i64 = 7;

/// Months compared when measuring the recent trend.
const TREND_WINDOW: usize = 4;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Store error: {0}")]
    Store(#[from] TagStoreError),
    #[error("Tag not found: {tag_id}")]
    TagNotFound { tag_id: Uuid },
}

#[derive(Debug, Deserialize)]
pub struct LifecycleQuery {
    pub tag_id: Uuid,
}

#[derive(Clone)]
pub struct LifecycleQueryHandler {
    tagging_store: Arc<dyn TaggingStore>,
}

impl LifecycleQueryHandler {
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
        &self, query: LifecycleQuery,
    ) -> Result<TagLifecycle, LifecycleError> {
        let tag = self
            .tagging_store
            .find_tag(query.tag_id)
            .await?
            .ok_or(LifecycleError::TagNotFound {
                tag_id: query.tag_id,
            })?;

        let history = self.tagging_store.tagging_history(tag.id).await?;
        if history.is_empty() {
            return Ok(empty_lifecycle(&tag));
        }

        let tagger_counts = self.tagging_store.tagger_counts(tag.id).await?;

        Ok(build_lifecycle(&tag, &history, &tagger_counts, Utc::now()))
    }
}

fn month_bucket(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

fn empty_lifecycle(tag: &Tag) -> TagLifecycle {
    TagLifecycle {
        tag_id: tag.id,
        tag_name: tag.name.clone(),
        created_at: tag.created_at,
        buckets: vec![],
        growth_rate: 0.0,
        decline_rate: 0.0,
        peak_usage: 0,
        peak_month: None,
        current_usage: 0,
        retention_rate: 0.0,
    }
}

fn average(buckets: &BTreeMap<String, i64>, months: &[&String]) -> f64 {
    let sum: i64 = months
        .iter()
        .map(|m| buckets.get(m.as_str()).copied().unwrap_or(0))
        .sum();
    sum as f64 / months.len().max(1) as f64
}

/// Derives the lifecycle report from the tag's full tagging history,
/// bucketed by calendar month. `history` must be in ascending order.
fn build_lifecycle(
    tag: &Tag, history: &[DateTime<Utc>], tagger_counts: &[i64],
    now: DateTime<Utc>,
) -> TagLifecycle {
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
    for at in history {
        *buckets.entry(month_bucket(at)).or_insert(0) += 1;
    }

    // Earliest month wins a tie for the peak.
    let mut peak_usage = 0;
    let mut peak_month = None;
    for (month, count) in &buckets {
        if *count > peak_usage {
            peak_usage = *count;
            peak_month = Some(month.clone());
        }
    }

    // Growth compares the first half of the tag's life to the second.
    let months: Vec<&String> = buckets.keys().collect();
    let mid = months.len() / 2;
    let first_half_avg = average(&buckets, &months[..mid]);
    let second_half_avg = average(&buckets, &months[mid..]);
    let growth_rate = if first_half_avg > 0.0 {
        (second_half_avg - first_half_avg) / first_half_avg * 100.0
    }
    else {
        0.0
    };

    // Decline compares the trailing months against the ones before them.
    let recent_start = months.len().saturating_sub(TREND_WINDOW);
    let older_start = months.len().saturating_sub(TREND_WINDOW * 2);
    let recent_avg = average(&buckets, &months[recent_start..]);
    let older_avg = average(&buckets, &months[older_start..recent_start]);
    let decline_rate = if older_avg > 0.0 {
        (older_avg - recent_avg) / older_avg * 100.0
    }
    else {
        0.0
    };

    let week_ago = now - Duration::days(CURRENT_USAGE_DAYS);
    let current_usage =
        history.iter().filter(|at| **at >= week_ago).count() as i64;

    // Share of taggers who came back to the tag more than once.
    let repeat_taggers =
        tagger_counts.iter().filter(|count| **count > 1).count();
    let retention_rate = if tagger_counts.is_empty() {
        0.0
    }
    else {
        repeat_taggers as f64 / tagger_counts.len() as f64 * 100.0
    };

    TagLifecycle {
        tag_id: tag.id,
        tag_name: tag.name.clone(),
        created_at: tag.created_at,
        buckets: buckets
            .into_iter()
            .map(|(month, count)| LifecycleBucket { month, count })
            .collect(),
        growth_rate,
        decline_rate,
        peak_usage,
        peak_month,
        current_usage,
        retention_rate,
    }
}
