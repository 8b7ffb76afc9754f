use async_trait::async_trait;
use sql_connection::SqlConnect;
use tag_errors::TagStoreError;
use tag_models::TagFeedEntry;
use uuid::Uuid;

/// Reads over `tag_subscriptions` and the tagging activity behind the feed.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn subscribed_tag_ids(
        &self, user_id: Uuid,
    ) -> Result<Vec<Uuid>, TagStoreError>;

    /// Taggings for the given tags, newest first, offset paginated.
    async fn feed_entries(
        &self, tag_ids: &[Uuid], limit: i64, offset: i64,
    ) -> Result<Vec<TagFeedEntry>, TagStoreError>;
}

pub struct PostgresSubscriptionStore {
    db: SqlConnect,
}

impl PostgresSubscriptionStore {
    pub fn new(db: SqlConnect) -> Self { Self { db } }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn subscribed_tag_ids(
        &self, user_id: Uuid,
    ) -> Result<Vec<Uuid>, TagStoreError> {
        let client = self.db.get_read_client().await?;

        let stmt = client
            .prepare(
                "SELECT tag_id FROM tag_subscriptions WHERE user_id = $1",
            )
            .await?;
        let rows = client.query(&stmt, &[&user_id]).await?;

        Ok(rows.iter().map(|row| row.get("tag_id")).collect())
    }

    async fn feed_entries(
        &self, tag_ids: &[Uuid], limit: i64, offset: i64,
    ) -> Result<Vec<TagFeedEntry>, TagStoreError> {
        let client = self.db.get_read_client().await?;

        let query = "SELECT tg.tag_id, t.name AS tag_name, tg.entity_type, \
                     tg.entity_id, tg.created_at
                     FROM taggings tg
                     JOIN tags t ON t.id = tg.tag_id
                     WHERE tg.tag_id = ANY($1)
                     ORDER BY tg.created_at DESC
                     LIMIT $2 OFFSET $3";

        let stmt = client.prepare(query).await?;
        let rows =
            client.query(&stmt, &[&tag_ids, &limit, &offset]).await?;

        let entries = rows
            .iter()
            .map(|row| {
                TagFeedEntry {
                    tag_id: row.get("tag_id"),
                    tag_name: row.get("tag_name"),
                    entity_type: row.get("entity_type"),
                    entity_id: row.get("entity_id"),
                    created_at: row.get("created_at"),
                }
            })
            .collect();

        Ok(entries)
    }
}
