use std::time::Duration;

// Cache keys for aggregate tag reports. Every parameter that changes a
// result is part of its key, so equivalent requests collide on the same
// entry and inequivalent ones never do.

/// Aggregates are served from memory for five minutes before the summary
/// view is consulted again.
pub const SUMMARY_TTL: Duration = Duration::from_secs(300);

pub fn top_tags_key(entity_type: Option<&str>, limit: i64) -> String {
    format!("tags:top:{}:{}", entity_type.unwrap_or("all"), limit)
}

pub fn heatmap_key() -> String { "tags:heatmap".to_string() }
