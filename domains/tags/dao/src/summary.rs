use std::collections::HashMap;

use async_trait::async_trait;
use sql_connection::SqlConnect;
use tag_errors::TagStoreError;
use tag_models::{HeatmapCell, TagCount, TagUsage};
use tracing::{info, instrument};

/// Tags shown per entity type in the heatmap.
const HEATMAP_TOP_TAGS: i64 = 10;

/// Reads over the `tag_usage_summary` materialized view.
#[async_trait]
pub trait TagSummaryStore: Send + Sync {
    async fn top_tags(
        &self, entity_type: Option<&str>, limit: i64,
    ) -> Result<Vec<TagUsage>, TagStoreError>;

    async fn heatmap(&self) -> Result<Vec<HeatmapCell>, TagStoreError>;

    async fn refresh(&self) -> Result<(), TagStoreError>;
}

pub struct PostgresTagSummaryStore {
    db: SqlConnect,
}

impl PostgresTagSummaryStore {
    pub fn new(db: SqlConnect) -> Self { Self { db } }
}

#[async_trait]
impl TagSummaryStore for PostgresTagSummaryStore {
    async fn top_tags(
        &self, entity_type: Option<&str>, limit: i64,
    ) -> Result<Vec<TagUsage>, TagStoreError> {
        let client = self.db.get_analytics_client().await?;

        let mut sql = "SELECT tag_id, name, entity_type, usage_count, \
                       taggings_count
                       FROM tag_usage_summary"
            .to_string();
        let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> =
            vec![];

        if let Some(et) = &entity_type {
            sql.push_str(" WHERE entity_type = $1");
            params.push(et);
        }

        sql.push_str(" ORDER BY usage_count DESC, taggings_count DESC");

        if entity_type.is_some() {
            sql.push_str(" LIMIT $2");
        }
        else {
            sql.push_str(" LIMIT $1");
        }
        params.push(&limit);

        let rows = client.query(&sql, &params).await?;

        let usages = rows
            .iter()
            .map(|row| {
                TagUsage {
                    tag_id: row.get("tag_id"),
                    name: row.get("name"),
                    entity_type: row.get("entity_type"),
                    usage_count: row.get("usage_count"),
                    taggings_count: row.get("taggings_count"),
                }
            })
            .collect();

        Ok(usages)
    }

    async fn heatmap(&self) -> Result<Vec<HeatmapCell>, TagStoreError> {
        let client = self.db.get_analytics_client().await?;

        let totals_query = "SELECT entity_type,
                                   SUM(usage_count)::bigint AS usage_count,
                                   SUM(taggings_count)::bigint AS \
                            taggings_count
                            FROM tag_usage_summary
                            GROUP BY entity_type
                            ORDER BY usage_count DESC, entity_type ASC";

        let stmt = client.prepare(totals_query).await?;
        let total_rows = client.query(&stmt, &[]).await?;

        // One ranked pass over the view covers every cell's top tags.
        let ranked_query = "SELECT entity_type, tag_id, name, usage_count
                            FROM (SELECT entity_type, tag_id, name, \
                            usage_count,
                                         ROW_NUMBER() OVER (PARTITION BY \
                            entity_type
                                             ORDER BY usage_count DESC, \
                            taggings_count DESC) AS rank
                                  FROM tag_usage_summary) ranked
                            WHERE rank <= $1
                            ORDER BY entity_type, rank";

        let stmt = client.prepare(ranked_query).await?;
        let ranked_rows = client.query(&stmt, &[&HEATMAP_TOP_TAGS]).await?;

        let mut top_by_type: HashMap<String, Vec<TagCount>> = HashMap::new();
        for row in &ranked_rows {
            let entity_type: String = row.get("entity_type");
            top_by_type.entry(entity_type).or_default().push(TagCount {
                tag_id: row.get("tag_id"),
                name: row.get("name"),
                count: row.get("usage_count"),
            });
        }

        let cells = total_rows
            .iter()
            .map(|row| {
                let entity_type: String = row.get("entity_type");
                let top_tags =
                    top_by_type.remove(&entity_type).unwrap_or_default();
                HeatmapCell {
                    entity_type,
                    usage_count: row.get("usage_count"),
                    taggings_count: row.get("taggings_count"),
                    top_tags,
                }
            })
            .collect();

        Ok(cells)
    }

    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<(), TagStoreError> {
        let client = self.db.get_client().await?;
        client
            .execute(
                "REFRESH MATERIALIZED VIEW CONCURRENTLY tag_usage_summary",
                &[],
            )
            .await?;

        info!("Refreshed tag usage summary materialized view");
        Ok(())
    }
}
