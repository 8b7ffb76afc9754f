use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sql_connection::SqlConnect;
use uuid::Uuid;

use crate::TestPostgresContainer;

pub fn create_sql_connect(container: &TestPostgresContainer) -> SqlConnect {
    SqlConnect::new(container.pool.clone())
}

/// Create a tag and return its id
pub async fn create_test_tag(
    container: &TestPostgresContainer, name: &str,
) -> Result<Uuid> {
    let tag_id = Uuid::now_v7();
    let slug = name.to_lowercase().replace(' ', "-");
    let client = container.pool.get().await?;
    client
        .execute(
            "INSERT INTO tags (id, name, slug, created_at) VALUES ($1, $2, \
             $3, NOW())",
            &[&tag_id, &name, &slug],
        )
        .await?;
    Ok(tag_id)
}

/// Tag an entity, returning the tagging id
pub async fn create_test_tagging(
    container: &TestPostgresContainer, tag_id: Uuid, entity_type: &str,
    entity_id: Uuid, tagged_by: Option<Uuid>,
) -> Result<Uuid> {
    create_test_tagging_at(
        container,
        tag_id,
        entity_type,
        entity_id,
        tagged_by,
        Utc::now(),
    )
    .await
}

/// Tag an entity at an explicit time, for history-shaped fixtures
pub async fn create_test_tagging_at(
    container: &TestPostgresContainer, tag_id: Uuid, entity_type: &str,
    entity_id: Uuid, tagged_by: Option<Uuid>, created_at: DateTime<Utc>,
) -> Result<Uuid> {
    let tagging_id = Uuid::now_v7();
    let client = container.pool.get().await?;
    client
        .execute(
            "INSERT INTO taggings (id, tag_id, entity_type, entity_id, \
             tagged_by, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &tagging_id,
                &tag_id,
                &entity_type,
                &entity_id,
                &tagged_by,
                &created_at,
            ],
        )
        .await?;
    Ok(tagging_id)
}

/// Record engagement counts for an entity
pub async fn set_engagement(
    container: &TestPostgresContainer, entity_type: &str, entity_id: Uuid,
    likes: i64, comments: i64, shares: i64,
) -> Result<()> {
    let client = container.pool.get().await?;
    client
        .execute(
            "INSERT INTO entity_engagement (entity_type, entity_id, \
             like_count, comment_count, share_count) VALUES ($1, $2, $3, \
             $4, $5) ON CONFLICT (entity_type, entity_id) DO UPDATE SET \
             like_count = $3, comment_count = $4, share_count = $5",
            &[&entity_type, &entity_id, &likes, &comments, &shares],
        )
        .await?;
    Ok(())
}

/// Subscribe a user to a tag
pub async fn subscribe_to_tag(
    container: &TestPostgresContainer, user_id: Uuid, tag_id: Uuid,
) -> Result<()> {
    let client = container.pool.get().await?;
    client
        .execute(
            "INSERT INTO tag_subscriptions (user_id, tag_id) VALUES ($1, \
             $2)",
            &[&user_id, &tag_id],
        )
        .await?;
    Ok(())
}

/// Create a live session for a user and return its bearer token
pub async fn create_test_session(
    container: &TestPostgresContainer, user_id: Uuid,
) -> Result<String> {
    let token = format!("tok_{}", Uuid::now_v7().simple());
    let expires_at = Utc::now() + Duration::hours(1);
    let client = container.pool.get().await?;
    client
        .execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, \
             $2, $3)",
            &[&token, &user_id, &expires_at],
        )
        .await?;
    Ok(token)
}

/// Create a session that has already expired
pub async fn create_expired_session(
    container: &TestPostgresContainer, user_id: Uuid,
) -> Result<String> {
    let token = format!("tok_{}", Uuid::now_v7().simple());
    let expires_at = Utc::now() - Duration::hours(1);
    let client = container.pool.get().await?;
    client
        .execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, \
             $2, $3)",
            &[&token, &user_id, &expires_at],
        )
        .await?;
    Ok(token)
}

/// Rebuild the tag usage summary after fixture inserts
pub async fn refresh_summary(container: &TestPostgresContainer) -> Result<()> {
    container
        .execute_sql("REFRESH MATERIALIZED VIEW tag_usage_summary")
        .await
}

/// Clean all test data from the database (useful for cleanup between tests
/// if needed)
pub async fn clean_test_data(
    container: &TestPostgresContainer,
) -> Result<()> {
    // Clean in dependency order
    container.execute_sql("DELETE FROM taggings").await?;
    container.execute_sql("DELETE FROM tag_subscriptions").await?;
    container.execute_sql("DELETE FROM entity_engagement").await?;
    container.execute_sql("DELETE FROM sessions").await?;
    container.execute_sql("DELETE FROM tags").await?;
    refresh_summary(container).await?;
    Ok(())
}
