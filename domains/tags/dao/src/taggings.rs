use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sql_connection::SqlConnect;
use tag_errors::TagStoreError;
use tag_models::{EngagementWindow, Tag};
use uuid::Uuid;

/// Reads over the base `tags` and `taggings` tables, joined against the
/// engagement snapshots where a report needs them.
#[async_trait]
pub trait TaggingStore: Send + Sync {
    async fn find_tag(&self, tag_id: Uuid)
    -> Result<Option<Tag>, TagStoreError>;

    async fn engagement_in_window(
        &self, tag_id: Uuid, since: DateTime<Utc>,
    ) -> Result<EngagementWindow, TagStoreError>;

    /// Every tagging timestamp for the tag, oldest first.
    async fn tagging_history(
        &self, tag_id: Uuid,
    ) -> Result<Vec<DateTime<Utc>>, TagStoreError>;

    /// Per-user tagging counts for the tag, one entry per distinct tagger.
    async fn tagger_counts(
        &self, tag_id: Uuid,
    ) -> Result<Vec<i64>, TagStoreError>;
}

pub struct PostgresTaggingStore {
    db: SqlConnect,
}

impl PostgresTaggingStore {
    pub fn new(db: SqlConnect) -> Self { Self { db } }
}

#[async_trait]
impl TaggingStore for PostgresTaggingStore {
    async fn find_tag(
        &self, tag_id: Uuid,
    ) -> Result<Option<Tag>, TagStoreError> {
        let client = self.db.get_read_client().await?;

        let stmt = client
            .prepare(
                "SELECT id, name, slug, created_at FROM tags WHERE id = $1",
            )
            .await?;
        let row = client.query_opt(&stmt, &[&tag_id]).await?;

        Ok(row.map(|row| {
            Tag {
                id: row.get("id"),
                name: row.get("name"),
                slug: row.get("slug"),
                created_at: row.get("created_at"),
            }
        }))
    }

    async fn engagement_in_window(
        &self, tag_id: Uuid, since: DateTime<Utc>,
    ) -> Result<EngagementWindow, TagStoreError> {
        let client = self.db.get_analytics_client().await?;

        // Taggings with no engagement row still count as tagged entities;
        // AVG skips their NULL counts.
        let query = "SELECT COUNT(*)::bigint AS tagged_entities,
                            COALESCE(AVG(e.like_count), 0)::float8 AS \
                     avg_likes,
                            COALESCE(AVG(e.comment_count), 0)::float8 AS \
                     avg_comments,
                            COALESCE(AVG(e.share_count), 0)::float8 AS \
                     avg_shares
                     FROM taggings tg
                     LEFT JOIN entity_engagement e
                       ON e.entity_type = tg.entity_type
                      AND e.entity_id = tg.entity_id
                     WHERE tg.tag_id = $1 AND tg.created_at >= $2";

        let stmt = client.prepare(query).await?;
        let row = client.query_one(&stmt, &[&tag_id, &since]).await?;

        Ok(EngagementWindow {
            tagged_entities: row.get("tagged_entities"),
            avg_likes: row.get("avg_likes"),
            avg_comments: row.get("avg_comments"),
            avg_shares: row.get("avg_shares"),
        })
    }

    async fn tagging_history(
        &self, tag_id: Uuid,
    ) -> Result<Vec<DateTime<Utc>>, TagStoreError> {
        let client = self.db.get_analytics_client().await?;

        let stmt = client
            .prepare(
                "SELECT created_at FROM taggings WHERE tag_id = $1 ORDER BY \
                 created_at ASC",
            )
            .await?;
        let rows = client.query(&stmt, &[&tag_id]).await?;

        Ok(rows.iter().map(|row| row.get("created_at")).collect())
    }

    async fn tagger_counts(
        &self, tag_id: Uuid,
    ) -> Result<Vec<i64>, TagStoreError> {
        let client = self.db.get_analytics_client().await?;

        let stmt = client
            .prepare(
                "SELECT COUNT(*)::bigint AS taggings
                 FROM taggings
                 WHERE tag_id = $1 AND tagged_by IS NOT NULL
                 GROUP BY tagged_by",
            )
            .await?;
        let rows = client.query(&stmt, &[&tag_id]).await?;

        Ok(rows.iter().map(|row| row.get("taggings")).collect())
    }
}
