use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Row of the tag_usage_summary materialized view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TagUsage {
    pub tag_id: Uuid,
    pub name: String,
    pub entity_type: String,
    pub usage_count: i64,
    pub taggings_count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TagCount {
    pub tag_id: Uuid,
    pub name: String,
    pub count: i64,
}

/// Usage density for one entity type, with its most-used tags
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeatmapCell {
    pub entity_type: String,
    pub usage_count: i64,
    pub taggings_count: i64,
    pub top_tags: Vec<TagCount>,
}

/// Engagement-attributable metrics for one tag over a trailing window
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TagImpactMetrics {
    pub tag_id: Uuid,
    pub tag_name: String,
    pub window_days: i64,
    pub tagged_entities: i64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
    pub engagement_uplift: f64,
    pub reach_score: f64,
    pub viral_coefficient: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LifecycleBucket {
    /// Month key in `%Y-%m` form
    pub month: String,
    pub count: i64,
}

/// Time-bucketed usage history of a tag from creation to present
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TagLifecycle {
    pub tag_id: Uuid,
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub buckets: Vec<LifecycleBucket>,
    pub growth_rate: f64,
    pub decline_rate: f64,
    pub peak_usage: i64,
    pub peak_month: Option<String>,
    pub current_usage: i64,
    pub retention_rate: f64,
}

/// "Entity X was tagged with tag Y at time T", joined against the tags a
/// user follows
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TagFeedEntry {
    pub tag_id: Uuid,
    pub tag_name: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Aggregate engagement snapshot for taggings inside a trailing window.
/// Averages are over tagged content that has engagement counts; counts are
/// read-only snapshots maintained upstream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngagementWindow {
    pub tagged_entities: i64,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
}
