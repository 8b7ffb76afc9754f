use async_trait::async_trait;
use sql_connection::SqlConnect;
use tag_errors::TagStoreError;
use uuid::Uuid;

/// Resolves bearer tokens to user ids via the sessions table.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Returns the owning user for a live session token, `None` when the
    /// token is unknown or the session has expired.
    async fn resolve_token(
        &self, token: &str,
    ) -> Result<Option<Uuid>, TagStoreError>;
}

pub struct PostgresPrincipalStore {
    db: SqlConnect,
}

impl PostgresPrincipalStore {
    pub fn new(db: SqlConnect) -> Self { Self { db } }
}

#[async_trait]
impl PrincipalStore for PostgresPrincipalStore {
    async fn resolve_token(
        &self, token: &str,
    ) -> Result<Option<Uuid>, TagStoreError> {
        let client = self.db.get_read_client().await?;

        let stmt = client
            .prepare(
                "SELECT user_id FROM sessions WHERE token = $1 AND \
                 expires_at > now()",
            )
            .await?;
        let row = client.query_opt(&stmt, &[&token]).await?;

        Ok(row.map(|row| row.get("user_id")))
    }
}
